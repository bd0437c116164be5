//! Analysis job lifecycle.
//!
//! `submit` validates the request and persists a `PROCESSING` job, then hands
//! the model call to a background task and returns. The task is the only
//! writer of the job's terminal state and communicates with callers solely
//! through the job record.
//!
//! Tasks are spawned detached. The orchestrator keeps their handles only to
//! wait on them, so dropping it (or a pending `wait_idle`) never cuts a job
//! short.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use covenant_ai::{Model, ModelError, ModelReply, build_prompt, parse_reply};
use covenant_core::{AnalysisJob, AnalysisKind, Contract, Document, JobOutcome};
use covenant_store::Repository;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{DocumentVersionManager, EngineConfig, EngineError};

pub struct AnalysisOrchestrator {
    repo: Arc<dyn Repository>,
    documents: Arc<DocumentVersionManager>,
    model: Arc<dyn Model>,
    config: EngineConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AnalysisOrchestrator {
    pub fn new(
        repo: Arc<dyn Repository>,
        documents: Arc<DocumentVersionManager>,
        model: Arc<dyn Model>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repo,
            documents,
            model,
            config,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Create a `PROCESSING` job and start analysing in the background.
    ///
    /// Validation failures are returned directly and leave no job behind.
    pub async fn submit(
        &self,
        contract_id: Uuid,
        document_id: Option<Uuid>,
        requested_by: Uuid,
        kind: AnalysisKind,
    ) -> Result<AnalysisJob, EngineError> {
        let document = self
            .documents
            .resolve_for_analysis(contract_id, document_id)
            .await?;
        let contract = self
            .repo
            .contract(contract_id)
            .await?
            .ok_or_else(|| EngineError::not_found("contract", contract_id))?;

        let job = AnalysisJob::new(
            contract_id,
            document.id,
            requested_by,
            kind,
            self.model.model_id(),
        );
        self.repo.insert_job(&job).await?;
        info!(
            job_id = %job.id,
            contract_id = %contract_id,
            document_id = %document.id,
            version = document.version,
            kind = %kind,
            "analysis submitted"
        );

        let run = Finalizer {
            job_id: job.id,
            contract,
            document,
            repo: Arc::clone(&self.repo),
            model: Arc::clone(&self.model),
            config: self.config.clone(),
        };
        let handle = tokio::spawn(run.run());
        let mut tasks = self.tasks();
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);

        Ok(job)
    }

    pub async fn get(&self, job_id: Uuid) -> Result<AnalysisJob, EngineError> {
        self.repo
            .job(job_id)
            .await?
            .ok_or_else(|| EngineError::not_found("analysis job", job_id))
    }

    /// Jobs for a contract, newest first.
    pub async fn list_for_contract(&self, contract_id: Uuid) -> Result<Vec<AnalysisJob>, EngineError> {
        if self.repo.contract(contract_id).await?.is_none() {
            return Err(EngineError::not_found("contract", contract_id));
        }
        Ok(self.repo.jobs_for_contract(contract_id).await?)
    }

    /// Wait for every background task spawned so far to finish.
    ///
    /// Cancelling this future stops the waiting, not the tasks.
    pub async fn wait_idle(&self) {
        let pending = std::mem::take(&mut *self.tasks());
        for handle in pending {
            log_join(handle.await);
        }
    }

    /// Background tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tasks().iter().filter(|h| !h.is_finished()).count()
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_join(done: Result<(), JoinError>) {
    if let Err(e) = done {
        if e.is_panic() {
            error!(error = %e, "analysis task panicked");
        }
    }
}

/// Everything the background half of a job needs, owned.
struct Finalizer {
    job_id: Uuid,
    contract: Contract,
    document: Document,
    repo: Arc<dyn Repository>,
    model: Arc<dyn Model>,
    config: EngineConfig,
}

impl Finalizer {
    async fn run(self) {
        let started = Instant::now();
        let outcome = match self.call_model().await {
            Ok(reply) => JobOutcome::Completed {
                result: parse_reply(&reply.text),
                model: reply.model,
            },
            Err(e) => {
                warn!(job_id = %self.job_id, error = %e, "model call failed");
                JobOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        match self
            .repo
            .finalize_job(self.job_id, outcome, started.elapsed())
            .await
        {
            Ok(job) => info!(
                job_id = %job.id,
                status = %job.status,
                processing_ms = job.processing_ms.unwrap_or_default(),
                model = %job.model,
                "analysis finished"
            ),
            Err(e) => error!(job_id = %self.job_id, error = %e, "failed to record analysis outcome"),
        }
    }

    async fn call_model(&self) -> Result<ModelReply, ModelError> {
        let request = self.model.request(build_prompt(&self.contract, &self.document));
        let attempts = self.config.model_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = tokio::time::timeout(self.config.model_timeout, self.model.complete(&request))
                .await
                .unwrap_or(Err(ModelError::Timeout(self.config.model_timeout)));
            match result {
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(job_id = %self.job_id, attempt, error = %e, "transient model failure, retrying");
                    tokio::time::sleep(self.config.retry_backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
