//! Error types for model-backed scoring calls.

/// Errors from the embedding and NLI model clients.
///
/// These never escape the engine's public surface: per-item failures are
/// excluded or defaulted, subsystem failures select the degraded strategy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("model backend is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("request timeout after {0} seconds")]
    Timeout(u64),
}

impl ModelError {
    /// Map a reqwest failure, preserving timeout identity.
    pub fn from_reqwest(e: reqwest::Error, timeout_secs: u64) -> Self {
        if e.is_timeout() {
            ModelError::Timeout(timeout_secs)
        } else {
            ModelError::Http(format!("request failed: {}", e))
        }
    }
}
