use thiserror::Error;

/// Failure kinds surfaced by the exploration flow. Everything a collaborator
/// can fail with collapses into one of these; the UI decides where each kind
/// is displayed (inline banner vs panel-local message).
#[derive(Debug, Error)]
pub enum ExploreError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("repository not found")]
    NotFound,

    #[error("rate limited by the repository API, retry in {reset_in_secs}s")]
    RateLimited { reset_in_secs: u64 },

    #[error("{0}")]
    Service(String),
}

impl ExploreError {
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
