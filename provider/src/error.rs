use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid request")]
    InvalidRequest,

    #[error("provider internal error")]
    InternalError,

    #[error("transaction rejected by the node")]
    TxSendFailure,

    #[error("transaction submission refused (rate limited)")]
    TxSendRefused,

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub(crate) fn decode(context: &str, e: impl std::fmt::Display) -> Self {
        Self::Decode(format!("{context}: {e}"))
    }
}

/// Status policy for balance and UTxO reads: 400 and 500 are surfaced,
/// any other HTTP failure degrades to `fallback`.
pub(crate) fn strict_or<T>(
    result: Result<T, ProviderError>,
    fallback: impl FnOnce() -> T,
) -> Result<T, ProviderError> {
    match result {
        Err(ProviderError::Status { status: 400, .. }) => Err(ProviderError::InvalidRequest),
        Err(ProviderError::Status { status: 500, .. }) => Err(ProviderError::InternalError),
        Err(ProviderError::Status { status, .. }) => {
            tracing::debug!(status, "provider soft failure");
            Ok(fallback())
        }
        other => other,
    }
}

/// Status policy for transaction submission.
pub(crate) fn submit_failure(e: ProviderError) -> ProviderError {
    match e {
        ProviderError::Status { status: 400, .. } => ProviderError::TxSendFailure,
        ProviderError::Status { status: 429, .. } => ProviderError::TxSendRefused,
        ProviderError::Status { status: 500, .. } => ProviderError::InternalError,
        ProviderError::Status { .. } => ProviderError::InvalidRequest,
        other => other,
    }
}

/// Optional lookups never fail; errors are logged and dropped.
pub(crate) fn optional<T>(what: &str, result: Result<T, ProviderError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(lookup = what, error = %e, "optional lookup failed");
            None
        }
    }
}
