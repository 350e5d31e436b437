//! Typed error enum for the LLM crate.

use thiserror::Error;

/// Errors from the remote analysis call and payload validation.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is missing")]
    MissingCredential,
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("request cancelled")]
    Cancelled,
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response: no text generated")]
    EmptyResponse,
    #[error("missing field in response: {0}")]
    MissingField(String),
    #[error("invalid field {field} in response: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("client initialization failed: {0}")]
    ClientInit(String),
    #[error("all retries exhausted, last error: {0}")]
    RetriesExhausted(Box<LlmError>),
}

impl LlmError {
    /// Whether this error is transient and should be retried by the transport.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(e) => !e.is_timeout(),
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 529),
            _ => false,
        }
    }

    /// Whether the service answered but the answer did not match the schema.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::JsonParse { .. } | Self::MissingField(_) | Self::InvalidField { .. })
    }
}
