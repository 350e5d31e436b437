//! Typed error enum for the service layer.
//!
//! Unifies input, LLM and storage failures into a single error type and
//! projects each onto the user-facing taxonomy via [`ServiceError::kind`].

use delivery_guard_core::CoreError;
use delivery_guard_llm::LlmError;
use delivery_guard_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying input, LLM and storage failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller provided invalid input (blank requirements).
    #[error("invalid input: {0}")]
    Core(#[from] CoreError),

    /// Remote analysis failed.
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    /// History write failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Another analysis is in flight.
    #[error("an analysis is already in progress")]
    Busy,

    #[error("analysis not found: {0}")]
    NotFound(String),

    /// The analyzer panicked.
    #[error("analysis task failed: {0}")]
    Task(String),
}

/// Failure classes surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Configuration,
    Transport,
    EmptyResponse,
    MalformedResponse,
    Storage,
    Busy,
    NotFound,
}

const CONFIGURATION_MESSAGE: &str =
    "API key is missing. Please check your environment configuration.";
const ANALYSIS_FAILED_MESSAGE: &str = "Failed to generate analysis. Please ensure your API key is \
configured correctly and try again.";

impl ServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(_) => ErrorKind::InvalidInput,
            Self::Llm(e) => match e {
                LlmError::MissingCredential => ErrorKind::Configuration,
                LlmError::EmptyResponse => ErrorKind::EmptyResponse,
                LlmError::JsonParse { .. }
                | LlmError::MissingField(_)
                | LlmError::InvalidField { .. } => ErrorKind::MalformedResponse,
                LlmError::HttpRequest(_)
                | LlmError::HttpStatus { .. }
                | LlmError::Timeout { .. }
                | LlmError::Cancelled
                | LlmError::ClientInit(_)
                | LlmError::RetriesExhausted(_) => ErrorKind::Transport,
            },
            Self::Storage(_) => ErrorKind::Storage,
            Self::Busy => ErrorKind::Busy,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Task(_) => ErrorKind::Transport,
        }
    }

    /// The single message shown to the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Configuration => CONFIGURATION_MESSAGE.to_owned(),
            ErrorKind::InvalidInput => {
                "Please describe the business requirements before starting an analysis.".to_owned()
            },
            ErrorKind::Busy => "An analysis is already in progress.".to_owned(),
            ErrorKind::NotFound => self.to_string(),
            ErrorKind::Storage => format!(
                "The analysis completed but could not be saved ({self}). \
                 It stays available until the application closes."
            ),
            ErrorKind::Transport | ErrorKind::EmptyResponse | ErrorKind::MalformedResponse => {
                format!("{ANALYSIS_FAILED_MESSAGE} ({self})")
            },
        }
    }
}
