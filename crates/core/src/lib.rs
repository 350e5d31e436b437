//! Core types and configuration for delivery-guard
//!
//! This crate contains domain types shared across all other crates.

mod analysis;
mod env_config;
mod error;
mod history;
mod json_utils;
mod settings;

pub use analysis::*;
pub use env_config::parse_with_default;
pub use error::*;
pub use history::HistoryItem;
pub use json_utils::strip_markdown_json;
pub use settings::*;
