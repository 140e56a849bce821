//! Error types for the language model layer.

use thiserror::Error;

/// Errors that can occur while talking to a language model.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No API key was configured for a backend that needs one.
    #[error("API key is missing")]
    MissingApiKey,

    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The service answered but produced no text.
    #[error("model returned no text")]
    EmptyResponse,

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether this error was caused by the request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
