//! Error types for the translation core.
//!
//! Provider and store failures are kept apart: provider failures are always
//! recovered at the leaf, store write failures are logged, and only a failed
//! cache read reaches the caller as a [`TranslateError`].

use thiserror::Error;

/// Failure of a single call to the external translation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("translation API rate limit exceeded")]
    RateLimited,

    #[error("translation response contained no choices")]
    EmptyResponse,

    #[error("translation call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to decode translation response: {0}")]
    Decode(String),

    #[error("translation client is shut down")]
    Closed,
}

/// Failure of the backing document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("document {kind}/{id} not found")]
    NotFound { kind: String, id: String },

    #[error("document has no usable id")]
    MissingId,

    #[error("stored document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::Unavailable(error.to_string())
    }
}

/// Error surfaced by the orchestrator to its caller.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("cannot read cached translations: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("stored document is corrupt: {0}")]
    CorruptDocument(#[source] StoreError),
}

impl TranslateError {
    /// Classify a failed store read: malformed data is not an outage.
    pub fn from_store_read(error: StoreError) -> Self {
        match error {
            StoreError::Serialization(_) => TranslateError::CorruptDocument(error),
            other => TranslateError::StoreUnavailable(other),
        }
    }

    /// Whether the caller should retry the whole request later.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::StoreUnavailable(_) => true,
            TranslateError::CorruptDocument(_) => false,
        }
    }
}
