//! Service layer for delivery-guard
//!
//! Sequences prompt building, the remote analysis call, result assembly and
//! history persistence, and publishes the state the presentation layer reads.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

mod assembler;
mod error;
mod orchestrator;

#[cfg(test)]
mod orchestrator_tests;

pub use assembler::{Clock, IdGenerator, ResultAssembler, SystemClock, UuidGenerator};
pub use error::{ErrorKind, ServiceError};
pub use orchestrator::{AnalysisPhase, Orchestrator, ViewState};
