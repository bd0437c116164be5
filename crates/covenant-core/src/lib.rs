pub mod analysis;
pub mod contract;
pub mod document;
pub mod job;

pub use analysis::{
    AnalysisResult, ClauseAssessment, ClauseStatus, KeyTerm, Obligation, ObligationStatus, Risk,
    Severity,
};
pub use contract::{Contract, ContractType};
pub use document::{Document, NewDocument};
pub use job::{AnalysisJob, AnalysisKind, JobOutcome, JobStatus, TransitionError};
