use async_trait::async_trait;
use delivery_guard_core::AnalysisReport;

use crate::ai_types::{ChatRequest, Message, ResponseFormat};
use crate::client::LlmClient;
use crate::error::LlmError;
use crate::prompt::AnalysisPrompt;
use crate::schema::{response_schema, SCHEMA_NAME};
use crate::validate::parse_payload;

/// Turns a prompt into a validated report.
///
/// The orchestrator depends on this seam rather than on the HTTP client so
/// tests can substitute scripted analyzers.
#[async_trait]
pub trait RequirementAnalyzer: Send + Sync {
    async fn analyze(&self, prompt: &AnalysisPrompt) -> Result<AnalysisReport, LlmError>;
}

/// Remote analysis over an OpenAI-compatible structured-output endpoint.
///
/// One request per call; no retries beyond the transport's own policy, no
/// caching, no partial results.
#[derive(Debug)]
pub struct RemoteAnalysisClient {
    llm: LlmClient,
}

impl RemoteAnalysisClient {
    #[must_use]
    pub const fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Sends the prompt with the schema directive and returns the raw text.
    ///
    /// # Errors
    /// See [`LlmClient`]: missing credential, transport failure or empty answer.
    pub async fn invoke(&self, prompt: &AnalysisPrompt) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.llm.model().to_owned(),
            messages: vec![
                Message { role: "system".to_owned(), content: prompt.system_role.clone() },
                Message { role: "user".to_owned(), content: prompt.user_prompt.clone() },
            ],
            response_format: ResponseFormat::json_schema(SCHEMA_NAME, response_schema()),
        };
        self.llm.chat_completion(&request).await
    }
}

#[async_trait]
impl RequirementAnalyzer for RemoteAnalysisClient {
    async fn analyze(&self, prompt: &AnalysisPrompt) -> Result<AnalysisReport, LlmError> {
        tracing::debug!(model = %self.llm.model(), "requesting delivery analysis");
        let text = self.invoke(prompt).await?;
        parse_payload(&text).inspect_err(|e| {
            tracing::warn!(error = %e, "analysis payload rejected");
        })
    }
}
