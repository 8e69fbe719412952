use thiserror::Error;

/// Misconfiguration detected while building the service. Never converted
/// into the fallback answer.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set.")]
    MissingCredential(&'static str),

    #[error("vector index not found at {0}; run `lawgeeks ingest` first")]
    MissingIndex(String),

    #[error("{0} is not a vector index written by `lawgeeks ingest`")]
    NotAnIndex(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Failure of one of the external collaborators during a request.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("vector index error: {0}")]
    Index(String),
}

impl UpstreamError {
    /// Whether a later identical attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Transport(_) => true,
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            UpstreamError::Malformed(_) | UpstreamError::Index(_) => false,
        }
    }
}

/// Looks through an `anyhow` chain for a typed upstream failure.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<UpstreamError>())
        .map(UpstreamError::is_retryable)
        .unwrap_or(false)
}
