//! Error types for the embedding cache.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Who is at fault for a failed request.
///
/// The transport maps this to a status code; the core never deals in
/// status codes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something unusable.
    Client,
    /// Storage, provider, or internal failure.
    Server,
}

/// Errors that can occur while resolving an embedding.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Request payload is missing a model name or input text.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Provider did not answer in time.
    #[error("provider timed out after {timeout:?}")]
    ProviderTimeout { timeout: Duration },

    /// Stored vector blob cannot be a sequence of f32 values.
    #[error("corrupt embedding blob: {len} bytes is not a multiple of 4")]
    CorruptBlob { len: usize },

    /// Durable storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Storage connection lock was poisoned by a panicking holder.
    #[error("storage lock poisoned")]
    LockPoisoned,

    /// A blocking storage task was cancelled or panicked.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl EmbeddingError {
    /// Classify the error for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmbeddingError::InvalidRequest(_) => ErrorKind::Client,
            _ => ErrorKind::Server,
        }
    }
}
