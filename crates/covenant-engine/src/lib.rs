//! Document version management and the analysis job lifecycle.

mod config;
mod error;
mod locks;
mod orchestrator;
mod versions;

pub use config::{EngineConfig, UploadPolicy};
pub use error::EngineError;
pub use orchestrator::AnalysisOrchestrator;
pub use versions::{DocumentVersionManager, UploadRequest};
