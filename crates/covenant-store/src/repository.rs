use std::time::Duration;

use async_trait::async_trait;
use covenant_core::{AnalysisJob, Contract, Document, JobOutcome, NewDocument};
use uuid::Uuid;

use crate::StoreError;

/// Result of deleting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub removed: Document,
    /// The surviving version that became latest, if the removed one was latest.
    pub promoted: Option<Document>,
}

/// Persistence for contracts, documents, and analysis jobs.
///
/// Implementations must make [`insert_latest_document`](Self::insert_latest_document)
/// and [`delete_document`](Self::delete_document) single atomic units: no reader
/// may observe a contract with two latest documents, or with zero while
/// documents remain.
#[async_trait]
pub trait Repository: Send + Sync {
    // ── Contracts ──

    async fn insert_contract(&self, contract: &Contract) -> Result<(), StoreError>;

    async fn contract(&self, id: Uuid) -> Result<Option<Contract>, StoreError>;

    // ── Documents ──

    async fn document(&self, id: Uuid) -> Result<Option<Document>, StoreError>;

    async fn latest_document(&self, contract_id: Uuid) -> Result<Option<Document>, StoreError>;

    /// All documents of a contract, highest version first.
    async fn documents_for_contract(&self, contract_id: Uuid) -> Result<Vec<Document>, StoreError>;

    /// Demote the current latest document and insert `doc` as the next version.
    async fn insert_latest_document(&self, doc: NewDocument) -> Result<Document, StoreError>;

    /// Delete a document, promoting the highest surviving version if the
    /// deleted one was latest. `Ok(None)` if no such document exists.
    async fn delete_document(&self, id: Uuid) -> Result<Option<Removal>, StoreError>;

    // ── Analysis jobs ──

    async fn insert_job(&self, job: &AnalysisJob) -> Result<(), StoreError>;

    async fn job(&self, id: Uuid) -> Result<Option<AnalysisJob>, StoreError>;

    /// All jobs for a contract, newest first.
    async fn jobs_for_contract(&self, contract_id: Uuid) -> Result<Vec<AnalysisJob>, StoreError>;

    /// Apply a job's terminal transition and return the updated record.
    async fn finalize_job(
        &self,
        id: Uuid,
        outcome: JobOutcome,
        elapsed: Duration,
    ) -> Result<AnalysisJob, StoreError>;
}
