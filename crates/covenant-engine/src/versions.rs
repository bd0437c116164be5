//! Versioned document uploads, lookups and deletion.
//!
//! Uploads and deletes for one contract are serialized through a per-contract
//! lock; the repository additionally performs each demote/insert and
//! delete/promote as one atomic unit.

use std::sync::Arc;

use covenant_core::{Document, NewDocument};
use covenant_store::{BlobReader, BlobStore, Repository, sha256_reader};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::locks::ContractLocks;
use crate::{EngineError, UploadPolicy};

/// One incoming file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub contract_id: Uuid,
    pub uploader_id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub struct DocumentVersionManager {
    repo: Arc<dyn Repository>,
    blobs: Arc<dyn BlobStore>,
    policy: UploadPolicy,
    locks: ContractLocks,
}

impl DocumentVersionManager {
    pub fn new(repo: Arc<dyn Repository>, blobs: Arc<dyn BlobStore>, policy: UploadPolicy) -> Self {
        Self {
            repo,
            blobs,
            policy,
            locks: ContractLocks::default(),
        }
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Store a new version and make it the contract's latest document.
    pub async fn upload(&self, req: UploadRequest) -> Result<Document, EngineError> {
        self.require_contract(req.contract_id).await?;
        self.check_policy(&req)?;

        let handle = self.blobs.put(&req.bytes, &req.filename).await?;
        debug!(handle = %handle, bytes = req.bytes.len(), "blob stored");

        match self.record_upload(&req, &handle).await {
            Ok(doc) => {
                info!(
                    contract_id = %doc.contract_id,
                    document_id = %doc.id,
                    version = doc.version,
                    size = doc.size,
                    "document uploaded"
                );
                Ok(doc)
            }
            Err(e) => {
                self.discard_blob(&handle).await;
                Err(e)
            }
        }
    }

    async fn record_upload(&self, req: &UploadRequest, handle: &str) -> Result<Document, EngineError> {
        let reader = self.blobs.get(handle).await?;
        let digest = sha256_reader(reader).await?;

        let new_doc = NewDocument {
            id: Uuid::new_v4(),
            contract_id: req.contract_id,
            storage_handle: handle.to_string(),
            original_name: req.filename.clone(),
            mime_type: req.mime_type.clone(),
            size: digest.size,
            checksum: digest.hex,
            uploaded_by: req.uploader_id,
        };

        let _guard = self.locks.acquire(req.contract_id).await;
        Ok(self.repo.insert_latest_document(new_doc).await?)
    }

    fn check_policy(&self, req: &UploadRequest) -> Result<(), EngineError> {
        if req.bytes.is_empty() {
            return Err(EngineError::BadRequest("no file uploaded".into()));
        }
        if req.bytes.len() > self.policy.max_bytes {
            return Err(EngineError::BadRequest(format!(
                "file is {} bytes, limit is {} bytes",
                req.bytes.len(),
                self.policy.max_bytes
            )));
        }
        if !self.policy.allows(&req.mime_type) {
            return Err(EngineError::BadRequest(format!(
                "unsupported file type: {}; only PDF and Word documents are accepted",
                req.mime_type
            )));
        }
        Ok(())
    }

    /// The contract's current latest document.
    pub async fn latest_for(&self, contract_id: Uuid) -> Result<Document, EngineError> {
        self.require_contract(contract_id).await?;
        self.repo
            .latest_document(contract_id)
            .await?
            .ok_or_else(|| EngineError::not_found("latest document for contract", contract_id))
    }

    /// Pick the document an analysis should run against: the requested one
    /// if given, otherwise the latest.
    pub async fn resolve_for_analysis(
        &self,
        contract_id: Uuid,
        document_id: Option<Uuid>,
    ) -> Result<Document, EngineError> {
        self.require_contract(contract_id).await?;
        let found = match document_id {
            Some(id) => self
                .repo
                .document(id)
                .await?
                .filter(|d| d.contract_id == contract_id),
            None => self.repo.latest_document(contract_id).await?,
        };
        found.ok_or_else(|| EngineError::BadRequest("no document found for analysis".into()))
    }

    /// Remove a document version, promoting the highest survivor if needed.
    /// Blob removal afterwards is best-effort.
    pub async fn delete(&self, document_id: Uuid) -> Result<Document, EngineError> {
        let doc = self.get(document_id).await?;

        let removal = {
            let _guard = self.locks.acquire(doc.contract_id).await;
            self.repo
                .delete_document(document_id)
                .await?
                .ok_or_else(|| EngineError::not_found("document", document_id))?
        };

        if let Some(promoted) = &removal.promoted {
            info!(
                contract_id = %promoted.contract_id,
                document_id = %promoted.id,
                version = promoted.version,
                "previous version is now latest"
            );
        }
        info!(
            contract_id = %removal.removed.contract_id,
            document_id = %removal.removed.id,
            version = removal.removed.version,
            "document deleted"
        );

        self.discard_blob(&removal.removed.storage_handle).await;
        Ok(removal.removed)
    }

    pub async fn get(&self, document_id: Uuid) -> Result<Document, EngineError> {
        self.repo
            .document(document_id)
            .await?
            .ok_or_else(|| EngineError::not_found("document", document_id))
    }

    /// Every version of a contract's document, newest version first.
    pub async fn list_for_contract(&self, contract_id: Uuid) -> Result<Vec<Document>, EngineError> {
        self.require_contract(contract_id).await?;
        Ok(self.repo.documents_for_contract(contract_id).await?)
    }

    /// Metadata and content stream for download.
    pub async fn open(&self, document_id: Uuid) -> Result<(Document, BlobReader), EngineError> {
        let doc = self.get(document_id).await?;
        let reader = self.blobs.get(&doc.storage_handle).await?;
        Ok((doc, reader))
    }

    async fn require_contract(&self, contract_id: Uuid) -> Result<(), EngineError> {
        match self.repo.contract(contract_id).await? {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("contract", contract_id)),
        }
    }

    async fn discard_blob(&self, handle: &str) {
        if let Err(e) = self.blobs.delete(handle).await {
            warn!(handle = %handle, error = %e, "failed to delete blob");
        }
    }
}
