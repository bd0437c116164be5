//! DuckDB-backed persistence for contracts, documents, and analysis jobs.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order is chronological. Analysis results are stored as
//! JSON text.
//!
//! Supports both in-memory (ephemeral) and persistent (file-backed) modes.
//! Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
//! for a database that survives process restarts.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use covenant_core::{
    AnalysisJob, AnalysisResult, Contract, Document, JobOutcome, NewDocument,
};
use duckdb::{Connection, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Removal, Repository, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contracts (
    id             VARCHAR PRIMARY KEY,
    name           VARCHAR NOT NULL,
    party_name     VARCHAR NOT NULL,
    contract_type  VARCHAR NOT NULL,
    value          DOUBLE,
    currency       VARCHAR NOT NULL,
    start_date     VARCHAR,
    expiry_date    VARCHAR,
    description    VARCHAR,
    created_at     VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS documents (
    id             VARCHAR PRIMARY KEY,
    contract_id    VARCHAR NOT NULL,
    storage_handle VARCHAR NOT NULL,
    original_name  VARCHAR NOT NULL,
    mime_type      VARCHAR NOT NULL,
    size           BIGINT  NOT NULL,
    checksum       VARCHAR NOT NULL,
    version        INTEGER NOT NULL,
    is_latest      BOOLEAN NOT NULL,
    uploaded_by    VARCHAR NOT NULL,
    created_at     VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS document_versions (
    contract_id    VARCHAR PRIMARY KEY,
    high_water     INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS analysis_jobs (
    id             VARCHAR PRIMARY KEY,
    seq            BIGINT  NOT NULL,
    contract_id    VARCHAR NOT NULL,
    document_id    VARCHAR NOT NULL,
    requested_by   VARCHAR NOT NULL,
    kind           VARCHAR NOT NULL,
    status         VARCHAR NOT NULL,
    result         VARCHAR,
    error          VARCHAR,
    processing_ms  BIGINT,
    model          VARCHAR NOT NULL,
    created_at     VARCHAR NOT NULL,
    completed_at   VARCHAR
);
";

const DOCUMENT_COLUMNS: &str = "id, contract_id, storage_handle, original_name, mime_type, size, \
     checksum, version, is_latest, uploaded_by, created_at";

const JOB_COLUMNS: &str = "id, contract_id, document_id, requested_by, kind, status, result, \
     error, processing_ms, model, created_at, completed_at";

/// DuckDB store for the document and analysis records.
///
/// The connection sits behind a mutex. Every [`Repository`] call runs on the
/// blocking pool and holds the lock for its whole duration; multi-statement
/// operations run in one transaction.
pub struct DuckStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        info!("duckdb schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the locked connection on tokio's blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Other("duckdb connection lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Other(format!("duckdb task failed: {e}")))?
    }

    // ── Row helpers ──

    fn fetch_documents(
        conn: &Connection,
        where_clause: &str,
        arg: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE {where_clause} ORDER BY version DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![arg], DocumentRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(DocumentRow::into_document).collect()
    }

    fn fetch_jobs(conn: &Connection, where_clause: &str, arg: &str) -> Result<Vec<AnalysisJob>, StoreError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE {where_clause} \
             ORDER BY created_at DESC, seq DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![arg], JobRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    fn write_job(conn: &Connection, job: &AnalysisJob) -> Result<(), StoreError> {
        let result = job.result.as_ref().map(serde_json::to_string).transpose()?;
        conn.execute(
            "UPDATE analysis_jobs
             SET status = ?, result = ?, error = ?, processing_ms = ?, model = ?, completed_at = ?
             WHERE id = ?",
            params![
                job.status.as_str(),
                result,
                job.error,
                job.processing_ms.map(|ms| ms as i64),
                job.model,
                job.completed_at.map(ts),
                job.id.to_string(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl Repository for DuckStore {
    async fn insert_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        let contract = contract.clone();
        self.with_conn(move |conn| {
            let exists: i64 = conn.query_row(
                "SELECT count(*)::BIGINT FROM contracts WHERE id = ?",
                params![contract.id.to_string()],
                |row| row.get(0),
            )?;
            if exists > 0 {
                return Err(StoreError::Duplicate(format!("contract {}", contract.id)));
            }
            conn.execute(
                "INSERT INTO contracts VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    contract.id.to_string(),
                    contract.name,
                    contract.party_name,
                    contract.contract_type.as_str(),
                    contract.value,
                    contract.currency,
                    contract.start_date.map(|d| d.to_string()),
                    contract.expiry_date.map(|d| d.to_string()),
                    contract.description,
                    ts(contract.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn contract(&self, id: Uuid) -> Result<Option<Contract>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, party_name, contract_type, value, currency, start_date, \
                 expiry_date, description, created_at FROM contracts WHERE id = ?",
            )?;
            let row = stmt
                .query_map(params![id.to_string()], ContractRow::read)?
                .next()
                .transpose()?;
            row.map(ContractRow::into_contract).transpose()
        })
        .await
    }

    async fn document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.with_conn(move |conn| {
            Ok(Self::fetch_documents(conn, "id = ?", &id.to_string())?
                .into_iter()
                .next())
        })
        .await
    }

    async fn latest_document(&self, contract_id: Uuid) -> Result<Option<Document>, StoreError> {
        self.with_conn(move |conn| {
            Ok(
                Self::fetch_documents(conn, "contract_id = ? AND is_latest", &contract_id.to_string())?
                    .into_iter()
                    .next(),
            )
        })
        .await
    }

    async fn documents_for_contract(&self, contract_id: Uuid) -> Result<Vec<Document>, StoreError> {
        self.with_conn(move |conn| Self::fetch_documents(conn, "contract_id = ?", &contract_id.to_string()))
            .await
    }

    async fn insert_latest_document(&self, doc: NewDocument) -> Result<Document, StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let contract_id = doc.contract_id.to_string();

            let contracts: i64 = tx.query_row(
                "SELECT count(*)::BIGINT FROM contracts WHERE id = ?",
                params![contract_id],
                |row| row.get(0),
            )?;
            if contracts == 0 {
                return Err(StoreError::ContractNotFound(doc.contract_id));
            }

            let next: i64 = tx.query_row(
                "SELECT greatest(
                     coalesce((SELECT max(version) FROM documents WHERE contract_id = ?), 0),
                     coalesce((SELECT max(high_water) FROM document_versions WHERE contract_id = ?), 0)
                 )::BIGINT + 1",
                params![contract_id, contract_id],
                |row| row.get(0),
            )?;

            let demoted = tx.execute(
                "UPDATE documents SET is_latest = false WHERE contract_id = ? AND is_latest",
                params![contract_id],
            )?;
            debug!(contract_id = %contract_id, demoted, "demoted previous latest");

            let document = doc.into_latest(next as u32, Utc::now());
            tx.execute(
                &format!("INSERT INTO documents ({DOCUMENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
                params![
                    document.id.to_string(),
                    contract_id,
                    document.storage_handle,
                    document.original_name,
                    document.mime_type,
                    document.size as i64,
                    document.checksum,
                    next,
                    true,
                    document.uploaded_by.to_string(),
                    ts(document.created_at),
                ],
            )?;
            tx.execute(
                "INSERT INTO document_versions VALUES (?, ?)
                 ON CONFLICT (contract_id) DO UPDATE SET high_water = excluded.high_water",
                params![contract_id, next],
            )?;
            tx.commit()?;
            Ok(document)
        })
        .await
    }

    async fn delete_document(&self, id: Uuid) -> Result<Option<Removal>, StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let Some(removed) = Self::fetch_documents(&tx, "id = ?", &id.to_string())?
                .into_iter()
                .next()
            else {
                return Ok(None);
            };
            tx.execute("DELETE FROM documents WHERE id = ?", params![id.to_string()])?;

            let mut promoted = None;
            if removed.is_latest {
                let contract_id = removed.contract_id.to_string();
                if let Some(mut next) = Self::fetch_documents(&tx, "contract_id = ?", &contract_id)?
                    .into_iter()
                    .next()
                {
                    tx.execute(
                        "UPDATE documents SET is_latest = true WHERE id = ?",
                        params![next.id.to_string()],
                    )?;
                    next.is_latest = true;
                    info!(document_id = %next.id, version = next.version, "promoted document to latest");
                    promoted = Some(next);
                }
            }
            tx.commit()?;
            Ok(Some(Removal { removed, promoted }))
        })
        .await
    }

    async fn insert_job(&self, job: &AnalysisJob) -> Result<(), StoreError> {
        let job = job.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let exists: i64 = tx.query_row(
                "SELECT count(*)::BIGINT FROM analysis_jobs WHERE id = ?",
                params![job.id.to_string()],
                |row| row.get(0),
            )?;
            if exists > 0 {
                return Err(StoreError::Duplicate(format!("analysis job {}", job.id)));
            }
            let seq: i64 = tx.query_row(
                "SELECT (coalesce(max(seq), 0) + 1)::BIGINT FROM analysis_jobs",
                params![],
                |row| row.get(0),
            )?;
            let result = job.result.as_ref().map(serde_json::to_string).transpose()?;
            tx.execute(
                &format!(
                    "INSERT INTO analysis_jobs (seq, {JOB_COLUMNS})
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    seq,
                    job.id.to_string(),
                    job.contract_id.to_string(),
                    job.document_id.to_string(),
                    job.requested_by.to_string(),
                    job.kind.as_str(),
                    job.status.as_str(),
                    result,
                    job.error,
                    job.processing_ms.map(|ms| ms as i64),
                    job.model,
                    ts(job.created_at),
                    job.completed_at.map(ts),
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn job(&self, id: Uuid) -> Result<Option<AnalysisJob>, StoreError> {
        self.with_conn(move |conn| {
            Ok(Self::fetch_jobs(conn, "id = ?", &id.to_string())?
                .into_iter()
                .next())
        })
        .await
    }

    async fn jobs_for_contract(&self, contract_id: Uuid) -> Result<Vec<AnalysisJob>, StoreError> {
        self.with_conn(move |conn| Self::fetch_jobs(conn, "contract_id = ?", &contract_id.to_string()))
            .await
    }

    async fn finalize_job(
        &self,
        id: Uuid,
        outcome: JobOutcome,
        elapsed: Duration,
    ) -> Result<AnalysisJob, StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut job = Self::fetch_jobs(&tx, "id = ?", &id.to_string())?
                .into_iter()
                .next()
                .ok_or(StoreError::JobNotFound(id))?;
            job.finalize(outcome, elapsed)?;
            Self::write_job(&tx, &job)?;
            tx.commit()?;
            Ok(job)
        })
        .await
    }
}

// ── Row mapping ──

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {s:?}: {e}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::Corrupt(format!("uuid {s:?}: {e}")))
}

fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    s.parse()
        .map_err(|e| StoreError::Corrupt(format!("date {s:?}: {e}")))
}

fn parse_label<T: std::str::FromStr<Err = String>>(s: &str) -> Result<T, StoreError> {
    s.parse().map_err(StoreError::Corrupt)
}

struct ContractRow {
    id: String,
    name: String,
    party_name: String,
    contract_type: String,
    value: Option<f64>,
    currency: String,
    start_date: Option<String>,
    expiry_date: Option<String>,
    description: Option<String>,
    created_at: String,
}

impl ContractRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            party_name: row.get(2)?,
            contract_type: row.get(3)?,
            value: row.get(4)?,
            currency: row.get(5)?,
            start_date: row.get(6)?,
            expiry_date: row.get(7)?,
            description: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_contract(self) -> Result<Contract, StoreError> {
        Ok(Contract {
            id: parse_uuid(&self.id)?,
            name: self.name,
            party_name: self.party_name,
            contract_type: parse_label(&self.contract_type)?,
            value: self.value,
            currency: self.currency,
            start_date: self.start_date.as_deref().map(parse_date).transpose()?,
            expiry_date: self.expiry_date.as_deref().map(parse_date).transpose()?,
            description: self.description,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

struct DocumentRow {
    id: String,
    contract_id: String,
    storage_handle: String,
    original_name: String,
    mime_type: String,
    size: i64,
    checksum: String,
    version: i64,
    is_latest: bool,
    uploaded_by: String,
    created_at: String,
}

impl DocumentRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            contract_id: row.get(1)?,
            storage_handle: row.get(2)?,
            original_name: row.get(3)?,
            mime_type: row.get(4)?,
            size: row.get(5)?,
            checksum: row.get(6)?,
            version: row.get(7)?,
            is_latest: row.get(8)?,
            uploaded_by: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_document(self) -> Result<Document, StoreError> {
        Ok(Document {
            id: parse_uuid(&self.id)?,
            contract_id: parse_uuid(&self.contract_id)?,
            storage_handle: self.storage_handle,
            original_name: self.original_name,
            mime_type: self.mime_type,
            size: self.size as u64,
            checksum: self.checksum,
            version: self.version as u32,
            is_latest: self.is_latest,
            uploaded_by: parse_uuid(&self.uploaded_by)?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

struct JobRow {
    id: String,
    contract_id: String,
    document_id: String,
    requested_by: String,
    kind: String,
    status: String,
    result: Option<String>,
    error: Option<String>,
    processing_ms: Option<i64>,
    model: String,
    created_at: String,
    completed_at: Option<String>,
}

impl JobRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            contract_id: row.get(1)?,
            document_id: row.get(2)?,
            requested_by: row.get(3)?,
            kind: row.get(4)?,
            status: row.get(5)?,
            result: row.get(6)?,
            error: row.get(7)?,
            processing_ms: row.get(8)?,
            model: row.get(9)?,
            created_at: row.get(10)?,
            completed_at: row.get(11)?,
        })
    }

    fn into_job(self) -> Result<AnalysisJob, StoreError> {
        let result = self
            .result
            .as_deref()
            .map(serde_json::from_str::<AnalysisResult>)
            .transpose()?;
        Ok(AnalysisJob {
            id: parse_uuid(&self.id)?,
            contract_id: parse_uuid(&self.contract_id)?,
            document_id: parse_uuid(&self.document_id)?,
            requested_by: parse_uuid(&self.requested_by)?,
            kind: parse_label(&self.kind)?,
            status: parse_label(&self.status)?,
            result,
            error: self.error,
            processing_ms: self.processing_ms.map(|ms| ms as u64),
            model: self.model,
            created_at: parse_ts(&self.created_at)?,
            completed_at: self.completed_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use covenant_core::{AnalysisKind, ContractType, JobStatus};

    use super::*;

    fn new_doc(contract_id: Uuid) -> NewDocument {
        NewDocument {
            id: Uuid::new_v4(),
            contract_id,
            storage_handle: format!("{}.pdf", Uuid::new_v4()),
            original_name: "lease.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 42,
            checksum: "ab".repeat(32),
            uploaded_by: Uuid::new_v4(),
        }
    }

    async fn store_with_contract() -> (DuckStore, Contract) {
        let store = DuckStore::open().unwrap();
        let mut contract = Contract::new("Office Lease", "Harbour Properties", ContractType::RealEstate);
        contract.value = Some(230000.0);
        contract.start_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        contract.description = Some("Floor 4".into());
        store.insert_contract(&contract).await.unwrap();
        (store, contract)
    }

    #[tokio::test]
    async fn contract_round_trips_through_sql() {
        let (store, contract) = store_with_contract().await;
        let loaded = store.contract(contract.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, contract.name);
        assert_eq!(loaded.value, Some(230000.0));
        assert_eq!(loaded.start_date, contract.start_date);
        assert_eq!(loaded.expiry_date, None);
        assert!(store.contract(Uuid::new_v4()).await.unwrap().is_none());
        assert!(matches!(
            store.insert_contract(&contract).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn versioning_and_promotion() {
        let (store, contract) = store_with_contract().await;
        let cid = contract.id;
        let v1 = store.insert_latest_document(new_doc(cid)).await.unwrap();
        let v2 = store.insert_latest_document(new_doc(cid)).await.unwrap();
        let v3 = store.insert_latest_document(new_doc(cid)).await.unwrap();
        assert_eq!((v1.version, v2.version, v3.version), (1, 2, 3));

        let docs = store.documents_for_contract(cid).await.unwrap();
        assert_eq!(docs.iter().filter(|d| d.is_latest).count(), 1);
        assert_eq!(docs[0].id, v3.id);

        let removal = store.delete_document(v3.id).await.unwrap().unwrap();
        assert_eq!(removal.promoted.map(|d| d.id), Some(v2.id));
        assert_eq!(store.latest_document(cid).await.unwrap().unwrap().id, v2.id);

        let v4 = store.insert_latest_document(new_doc(cid)).await.unwrap();
        assert_eq!(v4.version, 4);
        assert!(!store.document(v2.id).await.unwrap().unwrap().is_latest);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_issue_distinct_versions() {
        let (store, contract) = store_with_contract().await;
        let store = Arc::new(store);
        let cid = contract.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert_latest_document(new_doc(cid)).await })
            })
            .collect();
        let mut versions: Vec<u32> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().version)
            .collect();
        versions.sort_unstable();
        assert_eq!(versions, (1..=8).collect::<Vec<u32>>());

        let docs = store.documents_for_contract(cid).await.unwrap();
        assert_eq!(docs.iter().filter(|d| d.is_latest).count(), 1);
        assert_eq!(docs[0].version, 8);
        assert!(docs[0].is_latest);
    }

    #[tokio::test]
    async fn insert_for_missing_contract_fails() {
        let store = DuckStore::open().unwrap();
        let err = store
            .insert_latest_document(new_doc(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ContractNotFound(_)));
    }

    #[tokio::test]
    async fn job_lifecycle_persists_result() {
        let (store, contract) = store_with_contract().await;
        let doc = store.insert_latest_document(new_doc(contract.id)).await.unwrap();
        let first = AnalysisJob::new(contract.id, doc.id, Uuid::new_v4(), AnalysisKind::RiskAssessment, "m");
        let second = AnalysisJob::new(contract.id, doc.id, Uuid::new_v4(), AnalysisKind::SummaryOnly, "m");
        store.insert_job(&first).await.unwrap();
        store.insert_job(&second).await.unwrap();

        let result: AnalysisResult =
            serde_json::from_str(r#"{"summary": "ok", "risks": [{"type": "Low"}], "confidence": 60}"#).unwrap();
        let done = store
            .finalize_job(
                first.id,
                JobOutcome::Completed { result: result.clone(), model: "mock".into() },
                Duration::from_millis(30),
            )
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Completed);

        let loaded = store.job(first.id).await.unwrap().unwrap();
        assert_eq!(loaded.result, Some(result));
        assert_eq!(loaded.processing_ms, Some(30));
        assert_eq!(loaded.model, "mock");
        assert!(loaded.completed_at.is_some());

        let again = store
            .finalize_job(first.id, JobOutcome::Failed { error: "x".into() }, Duration::ZERO)
            .await;
        assert!(matches!(again, Err(StoreError::Transition(_))));

        let listed: Vec<Uuid> = store
            .jobs_for_contract(contract.id)
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn persistent_reopen_keeps_records() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("covenant.duckdb");
        let contract = Contract::new("NDA", "Beta Corp", ContractType::Nda);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        store.insert_contract(&contract).await.unwrap();
        let doc = store.insert_latest_document(new_doc(contract.id)).await.unwrap();
        drop(store);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        let latest = store.latest_document(contract.id).await.unwrap().unwrap();
        assert_eq!(latest.id, doc.id);
        assert_eq!(latest.checksum, doc.checksum);
    }
}
