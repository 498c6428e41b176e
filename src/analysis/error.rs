// analysis/error.rs
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analysis backend answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode analysis response: {0}")]
    Decode(String),

    #[error("analysis request timed out after {0:?}")]
    Timeout(Duration),

    #[error("analysis backend disabled")]
    Disabled,
}

impl AnalysisError {
    /// Failures worth retrying later (network trouble, timeouts, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            AnalysisError::Transport(_) | AnalysisError::Timeout(_) => true,
            AnalysisError::Status { status, .. } => *status >= 500,
            AnalysisError::Decode(_) | AnalysisError::Disabled => false,
        }
    }
}
