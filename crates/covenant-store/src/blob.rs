//! Opaque byte storage for uploaded documents.
//!
//! Handles are `<uuid><ext>` where `<ext>` is the original file extension, so
//! every upload gets its own blob even when contents are identical.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::debug;
use uuid::Uuid;

/// Readable blob content.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid blob handle: {0}")]
    InvalidHandle(String),

    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` and return a new handle. `original_name` only informs the
    /// handle's extension.
    async fn put(&self, bytes: &[u8], original_name: &str) -> Result<String, BlobError>;

    async fn get(&self, handle: &str) -> Result<BlobReader, BlobError>;

    async fn delete(&self, handle: &str) -> Result<(), BlobError>;
}

fn new_handle(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}{ext}", Uuid::new_v4())
}

/// Reject anything that could escape the blob root.
fn check_handle(handle: &str) -> Result<(), BlobError> {
    let ok = !handle.is_empty()
        && !handle.starts_with('.')
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if ok {
        Ok(())
    } else {
        Err(BlobError::InvalidHandle(handle.to_string()))
    }
}

// ── In-memory ──

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.blobs
            .lock()
            .map(|b| b.contains_key(handle))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, BlobError> {
        self.blobs
            .lock()
            .map_err(|_| BlobError::Other("memory blob store lock poisoned".into()))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8], original_name: &str) -> Result<String, BlobError> {
        let handle = new_handle(original_name);
        self.lock()?.insert(handle.clone(), bytes.to_vec());
        Ok(handle)
    }

    async fn get(&self, handle: &str) -> Result<BlobReader, BlobError> {
        let bytes = self
            .lock()?
            .get(handle)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(handle.to_string()))?;
        Ok(Box::pin(Cursor::new(bytes)))
    }

    async fn delete(&self, handle: &str) -> Result<(), BlobError> {
        self.lock()?
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(handle.to_string()))
    }
}

// ── Filesystem ──

/// Blobs as flat files under a root directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Use `root` as the blob directory, creating it if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, handle: &str) -> Result<PathBuf, BlobError> {
        check_handle(handle)?;
        Ok(self.root.join(handle))
    }
}

fn not_found_or_io(handle: &str, e: std::io::Error) -> BlobError {
    if e.kind() == std::io::ErrorKind::NotFound {
        BlobError::NotFound(handle.to_string())
    } else {
        BlobError::Io(e)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: &[u8], original_name: &str) -> Result<String, BlobError> {
        let handle = new_handle(original_name);
        let path = self.path_for(&handle)?;
        tokio::fs::write(&path, bytes).await?;
        debug!(handle = %handle, size = bytes.len(), "wrote blob");
        Ok(handle)
    }

    async fn get(&self, handle: &str) -> Result<BlobReader, BlobError> {
        let path = self.path_for(handle)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| not_found_or_io(handle, e))?;
        Ok(Box::pin(file))
    }

    async fn delete(&self, handle: &str) -> Result<(), BlobError> {
        let path = self.path_for(handle)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(handle, e))
    }
}
