//! OpenAI-compatible chat-completions backend
//!
//! Talks to `api.openai.com` by default; pointing `base_url` at any server
//! speaking the same protocol (vLLM, LiteLLM, OpenRouter) also works. When a
//! response schema is attached, it is forwarded as a strict `json_schema`
//! response format so the provider constrains decoding to it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::http_client::HttpClient;
use crate::types::{GenerationOutput, GenerationRequest, LlmBackend, Role};
use deckgen_config::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
const PROVIDER: &str = "openai";

/// Backend for OpenAI-compatible chat-completions endpoints
pub(crate) struct OpenAiBackend {
    http: HttpClient,
    base_url: String,
    api_key: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl OpenAiBackend {
    /// Build a backend from the process configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` when the API key environment
    /// variable is unset or the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key_env = config.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "API key environment variable '{api_key_env}' is not set"
            ))
        })?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http: HttpClient::new()?,
            base_url,
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, LlmError> {
        let messages: Vec<ChatMessage> = request
            .messages
            .iter()
            .map(|m| ChatMessage {
                role: match m.role {
                    Role::System => "system".to_string(),
                    Role::User => "user".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let response_format = request.response_schema.as_ref().map(|s| ResponseFormat {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: s.name.clone(),
                strict: true,
                schema: s.schema.clone(),
            },
        });

        let body = ChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens.or(self.max_tokens),
            temperature: request.temperature.or(self.temperature),
            response_format,
        };

        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            provider = PROVIDER,
            model = %request.model,
            constrained = body.response_format.is_some(),
            timeout_secs = request.timeout.as_secs(),
            "Sending chat completion request"
        );

        let http_request = reqwest::Client::new()
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self
            .http
            .execute_with_retry(http_request, request.timeout, PROVIDER)
            .await?;

        let response_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("failed to parse chat response: {e}")))?;

        let choice = response_body
            .choices
            .first()
            .ok_or_else(|| LlmError::Transport("chat response missing choices[0]".to_string()))?;

        let text = choice.message.content.clone().ok_or_else(|| {
            LlmError::Transport("chat response missing content in choices[0]".to_string())
        })?;

        let mut output = GenerationOutput::new(text, PROVIDER, request.model);
        if let Some(usage) = response_body.usage {
            output.tokens_input = Some(usage.prompt_tokens);
            output.tokens_output = Some(usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER,
            tokens_input = ?output.tokens_input,
            tokens_output = ?output.tokens_output,
            "Chat completion finished"
        );

        Ok(output)
    }
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

/// Chat-completions response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_schema_format() {
        let body = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            }],
            max_tokens: Some(4096),
            temperature: None,
            response_format: Some(ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: "deck".to_string(),
                    strict: true,
                    schema: serde_json::json!({"type": "object"}),
                },
            }),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_schema");
        assert_eq!(json["response_format"]["json_schema"]["name"], "deck");
        assert_eq!(json["response_format"]["json_schema"]["strict"], true);
        // Absent temperature stays off the wire
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_parses_with_and_without_usage() {
        let with_usage = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{}"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 34}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(with_usage).unwrap();
        assert_eq!(parsed.usage.unwrap().completion_tokens, 34);

        let without_usage = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(without_usage).unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("ok"));
    }
}
