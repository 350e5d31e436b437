//! Runtime configuration sourced from the process environment.

use std::path::PathBuf;

use crate::env_config::parse_with_default;

/// Credential variables, checked in order. Blank values count as absent.
pub const API_KEY_VARS: &[&str] = &["DELIVERY_GUARD_API_KEY", "GEMINI_API_KEY", "API_KEY"];
pub const API_URL_VAR: &str = "DELIVERY_GUARD_API_URL";
pub const MODEL_VAR: &str = "DELIVERY_GUARD_MODEL";
pub const TIMEOUT_VAR: &str = "DELIVERY_GUARD_TIMEOUT_SECS";
pub const MAX_RETRIES_VAR: &str = "DELIVERY_GUARD_MAX_RETRIES";
pub const HISTORY_PATH_VAR: &str = "DELIVERY_GUARD_HISTORY_PATH";

/// OpenAI-compatible endpoint of the Gemini API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Clone)]
pub struct Settings {
    api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub history_path: PathBuf,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("history_path", &self.history_path)
            .finish()
    }
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key =
            API_KEY_VARS.iter().find_map(|var| non_blank(*var)).map(|k| k.trim().to_owned());
        let base_url = non_blank(API_URL_VAR)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let model = non_blank(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_owned());
        let timeout_secs =
            parse_with_default(TIMEOUT_VAR, lookup(TIMEOUT_VAR), DEFAULT_TIMEOUT_SECS);
        let max_retries =
            parse_with_default(MAX_RETRIES_VAR, lookup(MAX_RETRIES_VAR), DEFAULT_MAX_RETRIES);
        let history_path =
            non_blank(HISTORY_PATH_VAR).map_or_else(default_history_path, PathBuf::from);

        Self { api_key, base_url, model, timeout_secs, max_retries, history_path }
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_history_path(mut self, path: PathBuf) -> Self {
        self.history_path = path;
        self
    }
}

#[must_use]
pub fn default_history_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("delivery-guard")
        .join("history.json")
}
