//! Versioned contract documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One uploaded version of a contract's document.
///
/// `version` is issued per contract, starting at 1, and never reused.
/// At most one document per contract has `is_latest` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub contract_id: Uuid,
    /// Opaque blob store handle.
    pub storage_handle: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the content.
    pub checksum: String,
    pub version: u32,
    pub is_latest: bool,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A document that has been stored and hashed but not yet given a version.
///
/// Stores turn this into a [`Document`] inside the same unit of work that
/// demotes the previous latest version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub storage_handle: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub checksum: String,
    pub uploaded_by: Uuid,
}

impl NewDocument {
    /// Materialize as the latest version of its contract.
    pub fn into_latest(self, version: u32, created_at: DateTime<Utc>) -> Document {
        Document {
            id: self.id,
            contract_id: self.contract_id,
            storage_handle: self.storage_handle,
            original_name: self.original_name,
            mime_type: self.mime_type,
            size: self.size,
            checksum: self.checksum,
            version,
            is_latest: true,
            uploaded_by: self.uploaded_by,
            created_at,
        }
    }
}
