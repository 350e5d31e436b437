//! LLM integration for delivery risk and effort analysis
//!
//! Builds the prompt and structured-output schema, calls an OpenAI-compatible
//! chat completions endpoint, and validates the returned document.

mod ai_types;
mod analysis;
mod client;
mod error;
mod prompt;
pub mod schema;
mod validate;


pub use analysis::{RemoteAnalysisClient, RequirementAnalyzer};
pub use client::{truncate, LlmClient, DEFAULT_RETRY_BACKOFF};
pub use error::LlmError;
pub use prompt::{build_prompt, AnalysisPrompt, SYSTEM_ROLE};
pub use validate::{parse_payload, validate_payload};
