//! Error types for the chat-completions client.
//!
//! [`LlmError`] separates rate limiting, API errors, empty responses and the
//! underlying network failures so the retry policy can tell which ones are
//! worth another attempt.

use thiserror::Error;

/// Errors that can occur while talking to the text-generation backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The server returned HTTP 429.
    /// `retry_after_ms` is how long the server asked us to wait.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-success HTTP status (401 bad key, 500 internal error...).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response parsed but carried no usable text.
    #[error("empty completion")]
    EmptyCompletion,

    /// Transport failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } | LlmError::NetworkError(_) => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::EmptyCompletion => false,
        }
    }
}
