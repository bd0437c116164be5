//! Analysis jobs and their lifecycle.
//!
//! A job starts in [`JobStatus::Processing`] and moves exactly once to
//! [`JobStatus::Completed`] or [`JobStatus::Failed`]. Terminal jobs are
//! immutable; [`AnalysisJob::finalize`] is the only way to change status.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::AnalysisResult;

/// What the caller asked the model to focus on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisKind {
    #[default]
    FullAnalysis,
    RiskAssessment,
    KeyTermsExtraction,
    ObligationExtraction,
    ClauseAnalysis,
    SummaryOnly,
    Comparison,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 7] = [
        Self::FullAnalysis,
        Self::RiskAssessment,
        Self::KeyTermsExtraction,
        Self::ObligationExtraction,
        Self::ClauseAnalysis,
        Self::SummaryOnly,
        Self::Comparison,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullAnalysis => "FULL_ANALYSIS",
            Self::RiskAssessment => "RISK_ASSESSMENT",
            Self::KeyTermsExtraction => "KEY_TERMS_EXTRACTION",
            Self::ObligationExtraction => "OBLIGATION_EXTRACTION",
            Self::ClauseAnalysis => "CLAUSE_ANALYSIS",
            Self::SummaryOnly => "SUMMARY_ONLY",
            Self::Comparison => "COMPARISON",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown analysis kind: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }

    /// The only legal moves are out of `Processing` into a terminal state.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(self, Self::Processing) && next.is_terminal()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed {
        result: AnalysisResult,
        /// Model identifier reported by the reply.
        model: String,
    },
    Failed {
        error: String,
    },
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Completed { .. } => JobStatus::Completed,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {job_id} is already {current}; refusing transition to {attempted}")]
pub struct TransitionError {
    pub job_id: Uuid,
    pub current: JobStatus,
    pub attempted: JobStatus,
}

/// One analysis request against one specific document version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub document_id: Uuid,
    pub requested_by: Uuid,
    pub kind: AnalysisKind,
    pub status: JobStatus,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    /// Wall-clock milliseconds from dispatch to finalization.
    pub processing_ms: Option<u64>,
    pub model: String,
    pub created_at: DateTime<Utc>,
    /// Set when the job completes successfully.
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisJob {
    /// A fresh job in `Processing`.
    pub fn new(
        contract_id: Uuid,
        document_id: Uuid,
        requested_by: Uuid,
        kind: AnalysisKind,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            document_id,
            requested_by,
            kind,
            status: JobStatus::Processing,
            result: None,
            error: None,
            processing_ms: None,
            model: model.into(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Apply the job's single terminal transition.
    pub fn finalize(&mut self, outcome: JobOutcome, elapsed: Duration) -> Result<(), TransitionError> {
        let next = outcome.status();
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                job_id: self.id,
                current: self.status,
                attempted: next,
            });
        }
        self.status = next;
        self.processing_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        match outcome {
            JobOutcome::Completed { result, model } => {
                self.result = Some(result);
                self.model = model;
                self.completed_at = Some(Utc::now());
            }
            JobOutcome::Failed { error } => {
                self.error = Some(error);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> AnalysisJob {
        AnalysisJob::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            AnalysisKind::SummaryOnly,
            "claude-3-sonnet-20240229",
        )
    }

    #[test]
    fn new_job_is_processing() {
        let j = job();
        assert_eq!(j.status, JobStatus::Processing);
        assert!(j.result.is_none() && j.error.is_none() && j.processing_ms.is_none());
        assert!(j.completed_at.is_none());
    }

    #[test]
    fn complete_records_result_model_and_duration() {
        let mut j = job();
        j.finalize(
            JobOutcome::Completed {
                result: AnalysisResult::degraded(),
                model: "mock".into(),
            },
            Duration::from_millis(1234),
        )
        .unwrap();
        assert_eq!(j.status, JobStatus::Completed);
        assert_eq!(j.model, "mock");
        assert_eq!(j.processing_ms, Some(1234));
        assert!(j.result.is_some());
        assert!(j.completed_at.is_some());
    }

    #[test]
    fn fail_records_error_without_completion_time() {
        let mut j = job();
        j.finalize(
            JobOutcome::Failed {
                error: "upstream returned 529".into(),
            },
            Duration::from_millis(10),
        )
        .unwrap();
        assert_eq!(j.status, JobStatus::Failed);
        assert_eq!(j.error.as_deref(), Some("upstream returned 529"));
        assert!(j.result.is_none());
        assert!(j.completed_at.is_none());
        assert_eq!(j.model, "claude-3-sonnet-20240229");
    }

    #[test]
    fn terminal_jobs_are_immutable() {
        let mut j = job();
        j.finalize(JobOutcome::Failed { error: "boom".into() }, Duration::ZERO)
            .unwrap();
        let before = j.clone();
        let err = j
            .finalize(
                JobOutcome::Completed {
                    result: AnalysisResult::default(),
                    model: "mock".into(),
                },
                Duration::ZERO,
            )
            .unwrap_err();
        assert_eq!(err.current, JobStatus::Failed);
        assert_eq!(err.attempted, JobStatus::Completed);
        assert_eq!(j, before);
    }

    #[test]
    fn transition_table() {
        use JobStatus::*;
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(!Processing.can_transition_to(Processing));
        for from in [Completed, Failed] {
            for to in [Processing, Completed, Failed] {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn kind_parses_wire_names() {
        assert_eq!(
            "SUMMARY_ONLY".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::SummaryOnly
        );
        assert_eq!(
            "risk-assessment".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::RiskAssessment
        );
        assert!("everything".parse::<AnalysisKind>().is_err());
        assert_eq!(AnalysisKind::default(), AnalysisKind::FullAnalysis);
    }
}
