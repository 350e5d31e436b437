use std::time::Duration;

use delivery_guard_core::Settings;

use crate::ai_types::{ChatRequest, ChatResponse};
use crate::error::LlmError;

/// First retry delay; doubled on every further attempt.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Client for an OpenAI-compatible chat completions API.
pub struct LlmClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) timeout_secs: u64,
    pub(crate) max_retries: u32,
    pub(crate) retry_backoff: Duration,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("client", &self.client)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl LlmClient {
    /// Creates a client with the given API key and base URL.
    ///
    /// An empty key is accepted here; every request then fails with
    /// [`LlmError::MissingCredential`] before touching the network.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(api_key: String, base_url: String, timeout_secs: u64) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            base_url,
            model: delivery_guard_core::DEFAULT_MODEL.to_owned(),
            timeout_secs,
            max_retries: delivery_guard_core::DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    /// Creates a client from loaded [`Settings`].
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, LlmError> {
        let client = Self::new(
            settings.api_key().unwrap_or_default().to_owned(),
            settings.base_url.clone(),
            settings.timeout_secs,
        )?;
        Ok(client.with_model(settings.model.clone()).with_max_retries(settings.max_retries))
    }

    /// Sets a custom model for this client.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request and return the first choice's text.
    ///
    /// Transient failures (connection errors, 429 and 5xx gateway statuses)
    /// are retried up to `max_retries` times with doubling backoff.
    ///
    /// # Errors
    /// Returns [`LlmError::MissingCredential`] without any I/O if no key is set;
    /// otherwise an error if the request fails or times out, the API returns a
    /// non-success status, the body cannot be parsed, or no text came back.
    pub(crate) async fn chat_completion(&self, request: &ChatRequest) -> Result<String, LlmError> {
        if !self.has_credential() {
            return Err(LlmError::MissingCredential);
        }

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.retry_backoff.saturating_mul(1 << (attempt - 1).min(4));
                tracing::warn!("LLM retry attempt {attempt}/{} after {delay:?}", self.max_retries);
                tokio::time::sleep(delay).await;
            }

            let err = match self.send_once(request).await {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };
            if !err.is_transient() {
                return Err(err);
            }
            tracing::warn!(error = %err, attempt, "transient LLM failure");
            last_error = Some(err);
        }

        let last = last_error.unwrap_or(LlmError::EmptyResponse);
        if self.max_retries == 0 {
            return Err(last);
        }
        Err(LlmError::RetriesExhausted(Box::new(last)))
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
            return Err(LlmError::HttpStatus { code: status.as_u16(), body });
        }

        let body = response.text().await.map_err(|e| self.map_request_error(e))?;
        let chat_response: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::JsonParse {
                context: format!("chat completion response (body: {})", truncate(&body, 200)),
                source: e,
            })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    fn map_request_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout { secs: self.timeout_secs }
        } else {
            LlmError::HttpRequest(err)
        }
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
