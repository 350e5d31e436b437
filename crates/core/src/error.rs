use thiserror::Error;

/// Errors raised while building or validating domain values.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid risk level: {0}")]
    InvalidRiskLevel(String),

    #[error("Invalid effort level: {0}")]
    InvalidEffortLevel(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
