use covenant_core::TransitionError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("contract not found: {0}")]
    ContractNotFound(Uuid),

    #[error("analysis job not found: {0}")]
    JobNotFound(Uuid),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
