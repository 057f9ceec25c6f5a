//! OpenAI chat-completions backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, LlmResult};
use crate::security::{secret_from_env, SecretString};
use crate::traits::llm::{CompletionRequest, LanguageModel};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Instruction sent as the system message on every call.
const SYSTEM_PROMPT: &str = "You are a due diligence analyst. Answer with a single JSON object \
                             and nothing else.";

/// Language model backed by the OpenAI chat-completions API.
#[derive(Clone)]
pub struct OpenAiModel {
    http_client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiModel {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> LlmResult<Self> {
        let api_key = secret_from_env("OPENAI_API_KEY")
            .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        let reasoning = uses_max_completion_tokens(&self.model);
        ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            // Reasoning models only accept the default temperature.
            temperature: (!reasoning).then_some(request.temperature),
            max_tokens: (!reasoning).then_some(request.max_output_tokens),
            max_completion_tokens: reasoning.then_some(request.max_output_tokens),
        }
    }
}

/// Whether a model takes `max_completion_tokens` instead of `max_tokens`.
fn uses_max_completion_tokens(model: &str) -> bool {
    model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
        || model.starts_with("gpt-5")
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        let start = Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&self.chat_request(request))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "OpenAI request failed");
                LlmError::Unavailable(Box::new(e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %body, "OpenAI API error");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Unavailable(Box::new(e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;
        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!(
                model = %self.model,
                max_output_tokens = request.max_output_tokens,
                "Completion hit the token limit, reply may be truncated"
            );
        }
        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        tracing::debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            response_chars = content.len(),
            "OpenAI chat completion"
        );
        Ok(content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape_for_chat_models() {
        let model = OpenAiModel::new("sk-test").with_model("gpt-4o");
        let request = CompletionRequest::new("extract").with_max_output_tokens(4000);
        let json = serde_json::to_value(model.chat_request(&request)).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][1]["content"], "extract");
        assert_eq!(json["max_tokens"], 4000);
        assert!(json.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_request_shape_for_reasoning_models() {
        let model = OpenAiModel::new("sk-test").with_model("o3-mini");
        let request = CompletionRequest::new("extract").with_max_output_tokens(6000);
        let json = serde_json::to_value(model.chat_request(&request)).unwrap();

        assert_eq!(json["max_completion_tokens"], 6000);
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_key_is_redacted() {
        let model = OpenAiModel::new("sk-very-secret");
        assert!(!format!("{:?}", model.api_key).contains("very-secret"));
    }
}
