//! Storage layer: record persistence (in-memory or DuckDB), blob storage, and checksums.

mod blob;
mod checksum;
mod error;
mod memory;
mod repository;

pub use blob::{BlobError, BlobReader, BlobStore, FsBlobStore, MemoryBlobStore};
pub use checksum::{Digest, sha256_reader};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use repository::{Removal, Repository};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
