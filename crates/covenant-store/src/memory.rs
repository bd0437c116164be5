//! In-process store backed by hash maps behind a single mutex.
//!
//! Every trait method takes the lock once, so each call is atomic with respect
//! to every other call. Used by tests and by embedders that do not need
//! durability.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use covenant_core::{AnalysisJob, Contract, Document, JobOutcome, NewDocument};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Removal, Repository, StoreError};

#[derive(Default)]
struct Tables {
    contracts: HashMap<Uuid, Contract>,
    documents: HashMap<Uuid, Document>,
    /// contract_id → highest version ever issued.
    version_marks: HashMap<Uuid, u32>,
    /// Insertion order doubles as the tie-break for equal timestamps.
    jobs: Vec<AnalysisJob>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Other("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn insert_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        let mut t = self.tables()?;
        if t.contracts.contains_key(&contract.id) {
            return Err(StoreError::Duplicate(format!("contract {}", contract.id)));
        }
        t.contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    async fn contract(&self, id: Uuid) -> Result<Option<Contract>, StoreError> {
        Ok(self.tables()?.contracts.get(&id).cloned())
    }

    async fn document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        Ok(self.tables()?.documents.get(&id).cloned())
    }

    async fn latest_document(&self, contract_id: Uuid) -> Result<Option<Document>, StoreError> {
        let t = self.tables()?;
        Ok(t.documents
            .values()
            .find(|d| d.contract_id == contract_id && d.is_latest)
            .cloned())
    }

    async fn documents_for_contract(&self, contract_id: Uuid) -> Result<Vec<Document>, StoreError> {
        let t = self.tables()?;
        let mut docs: Vec<Document> = t
            .documents
            .values()
            .filter(|d| d.contract_id == contract_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(docs)
    }

    async fn insert_latest_document(&self, doc: NewDocument) -> Result<Document, StoreError> {
        let mut t = self.tables()?;
        if !t.contracts.contains_key(&doc.contract_id) {
            return Err(StoreError::ContractNotFound(doc.contract_id));
        }
        if t.documents.contains_key(&doc.id) {
            return Err(StoreError::Duplicate(format!("document {}", doc.id)));
        }

        let contract_id = doc.contract_id;
        let surviving_max = t
            .documents
            .values()
            .filter(|d| d.contract_id == contract_id)
            .map(|d| d.version)
            .max()
            .unwrap_or(0);
        let mark = t.version_marks.get(&contract_id).copied().unwrap_or(0);
        let version = surviving_max.max(mark) + 1;

        for d in t.documents.values_mut() {
            if d.contract_id == contract_id && d.is_latest {
                debug!(document_id = %d.id, version = d.version, "demoting latest document");
                d.is_latest = false;
            }
        }

        let document = doc.into_latest(version, Utc::now());
        t.version_marks.insert(contract_id, version);
        t.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn delete_document(&self, id: Uuid) -> Result<Option<Removal>, StoreError> {
        let mut t = self.tables()?;
        let Some(removed) = t.documents.remove(&id) else {
            return Ok(None);
        };

        let mut promoted = None;
        if removed.is_latest {
            let next = t
                .documents
                .values_mut()
                .filter(|d| d.contract_id == removed.contract_id)
                .max_by_key(|d| d.version);
            if let Some(next) = next {
                next.is_latest = true;
                info!(document_id = %next.id, version = next.version, "promoted document to latest");
                promoted = Some(next.clone());
            }
        }

        Ok(Some(Removal { removed, promoted }))
    }

    async fn insert_job(&self, job: &AnalysisJob) -> Result<(), StoreError> {
        let mut t = self.tables()?;
        if t.jobs.iter().any(|j| j.id == job.id) {
            return Err(StoreError::Duplicate(format!("analysis job {}", job.id)));
        }
        t.jobs.push(job.clone());
        Ok(())
    }

    async fn job(&self, id: Uuid) -> Result<Option<AnalysisJob>, StoreError> {
        Ok(self.tables()?.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn jobs_for_contract(&self, contract_id: Uuid) -> Result<Vec<AnalysisJob>, StoreError> {
        let t = self.tables()?;
        let mut jobs: Vec<AnalysisJob> = t
            .jobs
            .iter()
            .rev()
            .filter(|j| j.contract_id == contract_id)
            .cloned()
            .collect();
        // Stable sort keeps later insertions first among equal timestamps.
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn finalize_job(
        &self,
        id: Uuid,
        outcome: JobOutcome,
        elapsed: Duration,
    ) -> Result<AnalysisJob, StoreError> {
        let mut t = self.tables()?;
        let job = t
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(StoreError::JobNotFound(id))?;
        job.finalize(outcome, elapsed)?;
        Ok(job.clone())
    }
}
