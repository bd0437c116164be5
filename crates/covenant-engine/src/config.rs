use std::time::Duration;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Upload filter applied before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_mime_types: vec![
                "application/pdf".into(),
                "application/msword".into(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
            ],
        }
    }
}

impl UploadPolicy {
    /// MIME parameters (`; charset=...`) are ignored and matching is
    /// case-insensitive.
    pub fn allows(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(essence))
    }
}

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on a single model call.
    pub model_timeout: Duration,
    /// Total tries per job for transient model failures. 1 means no retry.
    pub model_attempts: u32,
    /// Pause between tries.
    pub retry_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_secs(120),
            model_attempts: 1,
            retry_backoff: Duration::from_millis(500),
        }
    }
}
