//! Structured analysis payload produced from a model reply.
//!
//! The serde shape matches the JSON schema the model is asked to answer in
//! (`summary`, `keyTerms`, `risks`, `obligations`, `clauses`, `confidence`).
//! Decoding is forgiving. Absent or `null` fields take their zero value, enum
//! labels match case-insensitively, and confidences are normalised to 0..=100.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Summary used when a reply could not be decoded.
pub const DEGRADED_SUMMARY: &str = "Analysis completed but response parsing failed.";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    #[serde(deserialize_with = "nullable")]
    pub summary: String,
    #[serde(deserialize_with = "nullable")]
    pub key_terms: Vec<KeyTerm>,
    #[serde(deserialize_with = "nullable")]
    pub risks: Vec<Risk>,
    #[serde(deserialize_with = "nullable")]
    pub obligations: Vec<Obligation>,
    #[serde(rename = "clauses", deserialize_with = "nullable")]
    pub clause_assessments: Vec<ClauseAssessment>,
    #[serde(deserialize_with = "confidence")]
    pub confidence: u8,
}

impl AnalysisResult {
    /// The valid-but-empty result recorded when parsing fails.
    pub fn degraded() -> Self {
        Self {
            summary: DEGRADED_SUMMARY.to_string(),
            ..Self::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.confidence == 0 && self.summary == DEGRADED_SUMMARY
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyTerm {
    #[serde(deserialize_with = "nullable")]
    pub term: String,
    #[serde(deserialize_with = "text")]
    pub value: String,
    #[serde(deserialize_with = "confidence")]
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    #[serde(rename = "type")]
    pub severity: Severity,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub clause: String,
    #[serde(deserialize_with = "nullable")]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Obligation {
    #[serde(deserialize_with = "nullable")]
    pub party: String,
    #[serde(rename = "obligation", deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "text")]
    pub deadline: String,
    pub status: ObligationStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClauseAssessment {
    #[serde(deserialize_with = "nullable")]
    pub category: String,
    pub status: ClauseStatus,
    #[serde(deserialize_with = "nullable")]
    pub text: String,
}

// ── Labels ──

/// Implements `Deserialize` from a free-form label, falling back to the
/// type's default for null or unrecognised values.
macro_rules! lenient_label {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = Option::<String>::deserialize(d)?;
                Ok(raw.as_deref().and_then($ty::from_label).unwrap_or_default())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" => Some(Self::High),
            "medium" | "moderate" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

lenient_label!(Severity);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationStatus {
    Active,
    Completed,
    #[default]
    Pending,
}

impl ObligationStatus {
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "completed" | "complete" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

lenient_label!(ObligationStatus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ClauseStatus {
    #[serde(rename = "standard")]
    Standard,
    #[default]
    #[serde(rename = "review")]
    Review,
    #[serde(rename = "non-standard")]
    NonStandard,
}

impl ClauseStatus {
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "review" => Some(Self::Review),
            "non-standard" | "non_standard" | "nonstandard" => Some(Self::NonStandard),
            _ => None,
        }
    }
}

lenient_label!(ClauseStatus);

// ── Field normalisation ──

/// Map a raw model confidence onto 0..=100.
///
/// Fractions strictly between 0 and 1 are read as ratios (`0.85` → 85).
pub fn normalize_confidence(raw: f64) -> u8 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    let pct = if raw < 1.0 { raw * 100.0 } else { raw };
    pct.round().clamp(0.0, 100.0) as u8
}

fn confidence<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64().map(normalize_confidence).unwrap_or(0),
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map(normalize_confidence)
            .unwrap_or(0),
        _ => 0,
    })
}

/// `null` reads as the field's zero value.
fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_model_schema() {
        let json = r#"{
            "summary": "Two-year services agreement.",
            "keyTerms": [{"term": "Term", "value": "24 months", "confidence": 95}],
            "risks": [{
                "type": "High",
                "title": "Uncapped liability",
                "description": "No limitation of liability clause.",
                "clause": "Section 9",
                "recommendation": "Negotiate a cap."
            }],
            "obligations": [{
                "party": "Supplier",
                "obligation": "Deliver monthly reports",
                "deadline": "5th business day",
                "status": "active"
            }],
            "clauses": [{"category": "Termination", "status": "non-standard", "text": "90 days"}],
            "confidence": 85
        }"#;
        let r: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.summary, "Two-year services agreement.");
        assert_eq!(r.key_terms[0].value, "24 months");
        assert_eq!(r.risks[0].severity, Severity::High);
        assert_eq!(r.risks[0].clause, "Section 9");
        assert_eq!(r.obligations[0].description, "Deliver monthly reports");
        assert_eq!(r.obligations[0].status, ObligationStatus::Active);
        assert_eq!(r.clause_assessments[0].status, ClauseStatus::NonStandard);
        assert_eq!(r.confidence, 85);
    }

    #[test]
    fn missing_fields_take_zero_values() {
        let r: AnalysisResult = serde_json::from_str(r#"{"summary": "only a summary"}"#).unwrap();
        assert_eq!(r.summary, "only a summary");
        assert!(r.key_terms.is_empty());
        assert!(r.risks.is_empty());
        assert!(r.obligations.is_empty());
        assert!(r.clause_assessments.is_empty());
        assert_eq!(r.confidence, 0);

        let empty: AnalysisResult = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, AnalysisResult::default());
    }

    #[test]
    fn null_fields_take_zero_values() {
        let json = r#"{
            "summary": null,
            "keyTerms": [{"term": null, "value": "net 30"}],
            "risks": [{"type": "High", "title": "Auto-renewal", "description": null, "clause": null, "recommendation": null}],
            "obligations": null,
            "clauses": [{"category": null, "status": "standard", "text": null}],
            "confidence": 66
        }"#;
        let r: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.summary, "");
        assert_eq!(r.key_terms[0].term, "");
        assert_eq!(r.key_terms[0].value, "net 30");
        assert_eq!(r.risks[0].title, "Auto-renewal");
        assert_eq!(r.risks[0].clause, "");
        assert_eq!(r.risks[0].recommendation, "");
        assert!(r.obligations.is_empty());
        assert_eq!(r.clause_assessments[0].category, "");
        assert_eq!(r.clause_assessments[0].status, ClauseStatus::Standard);
        assert_eq!(r.confidence, 66);

        let r: AnalysisResult = serde_json::from_str(
            r#"{"keyTerms": null, "risks": null, "clauses": null, "obligations": [{"party": null, "obligation": null}]}"#,
        )
        .unwrap();
        assert!(r.key_terms.is_empty() && r.risks.is_empty() && r.clause_assessments.is_empty());
        assert_eq!(r.obligations[0], Obligation::default());
    }

    #[test]
    fn labels_match_case_insensitively_and_fall_back() {
        let json = r#"{
            "risks": [{"type": "LOW"}, {"type": "catastrophic"}, {"type": null}],
            "obligations": [{"status": "Completed"}, {"status": "overdue"}],
            "clauses": [{"status": "NON_STANDARD"}, {"status": "STANDARD"}, {}]
        }"#;
        let r: AnalysisResult = serde_json::from_str(json).unwrap();
        let sev: Vec<_> = r.risks.iter().map(|x| x.severity).collect();
        assert_eq!(sev, [Severity::Low, Severity::Medium, Severity::Medium]);
        let obl: Vec<_> = r.obligations.iter().map(|x| x.status).collect();
        assert_eq!(obl, [ObligationStatus::Completed, ObligationStatus::Pending]);
        let cl: Vec<_> = r.clause_assessments.iter().map(|x| x.status).collect();
        assert_eq!(
            cl,
            [ClauseStatus::NonStandard, ClauseStatus::Standard, ClauseStatus::Review]
        );
    }

    #[test]
    fn confidence_normalisation() {
        assert_eq!(normalize_confidence(85.0), 85);
        assert_eq!(normalize_confidence(0.85), 85);
        assert_eq!(normalize_confidence(1.0), 1);
        assert_eq!(normalize_confidence(250.0), 100);
        assert_eq!(normalize_confidence(-3.0), 0);
        assert_eq!(normalize_confidence(f64::NAN), 0);

        let r: AnalysisResult = serde_json::from_str(r#"{"confidence": "72%"}"#).unwrap();
        assert_eq!(r.confidence, 72);
        let r: AnalysisResult = serde_json::from_str(r#"{"confidence": null}"#).unwrap();
        assert_eq!(r.confidence, 0);
    }

    #[test]
    fn non_string_values_are_rendered_as_text() {
        let json = r#"{"keyTerms": [{"term": "Fee", "value": 4500}, {"term": "Auto-renew", "value": true}]}"#;
        let r: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.key_terms[0].value, "4500");
        assert_eq!(r.key_terms[1].value, "true");
    }

    #[test]
    fn serialized_form_reads_back() {
        let json = r#"{"summary": "s", "risks": [{"type": "High", "title": "t"}], "clauses": [{"status": "review"}], "confidence": 40}"#;
        let r: AnalysisResult = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&r).unwrap();
        assert_eq!(out["risks"][0]["type"], "High");
        assert_eq!(out["clauses"][0]["status"], "review");
        assert_eq!(out["keyTerms"], serde_json::json!([]));
        let back: AnalysisResult = serde_json::from_value(out).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn degraded_result_is_recognisable() {
        let d = AnalysisResult::degraded();
        assert!(d.is_degraded());
        assert_eq!(d.confidence, 0);
        assert!(d.key_terms.is_empty() && d.risks.is_empty());
        assert!(!AnalysisResult::default().is_degraded());
    }
}
