//! Google Gemini backend
//!
//! Uses the `generateContent` REST endpoint. System messages travel as the
//! request-level system instruction, user messages as conversation contents.
//! When a response schema is attached, the request asks for `application/json`
//! output constrained to that schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::http_client::HttpClient;
use crate::types::{GenerationOutput, GenerationRequest, LlmBackend, Role};
use deckgen_config::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";
const PROVIDER: &str = "google";

/// Backend for the Gemini `generateContent` API
pub(crate) struct GeminiBackend {
    http: HttpClient,
    base_url: String,
    api_key: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl GeminiBackend {
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
impl LlmBackend for GeminiBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, LlmError> {
        // System messages become the request-level instruction, user messages
        // the conversation turns.
        let system_text: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: vec![Part {
                    text: system_text.join("\n\n"),
                }],
            })
        };

        let contents: Vec<Content> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let generation_config = GenerationConfig {
            temperature: request.temperature.or(self.temperature),
            max_output_tokens: request.max_tokens.or(self.max_tokens),
            response_mime_type: request
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema: request.response_schema.as_ref().map(|s| s.schema.clone()),
        };

        let body = GenerateContentRequest {
            system_instruction,
            contents,
            generation_config,
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        debug!(
            provider = PROVIDER,
            model = %request.model,
            constrained = body.generation_config.response_schema.is_some(),
            timeout_secs = request.timeout.as_secs(),
            "Sending generateContent request"
        );

        let http_request = reqwest::Client::new()
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self
            .http
            .execute_with_retry(http_request, request.timeout, PROVIDER)
            .await?;

        let response_body: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("failed to parse generateContent response: {e}"))
        })?;

        let candidate = response_body.candidates.first().ok_or_else(|| {
            LlmError::Transport("generateContent response missing candidates[0]".to_string())
        })?;

        let text = candidate
            .content
            .parts
            .first()
            .map(|p| p.text.clone())
            .ok_or_else(|| {
                LlmError::Transport("generateContent response missing text part".to_string())
            })?;

        let mut output = GenerationOutput::new(text, PROVIDER, request.model);
        if let Some(usage) = response_body.usage_metadata {
            output.tokens_input = usage.prompt_token_count;
            output.tokens_output = usage.candidates_token_count;
        }

        debug!(
            provider = PROVIDER,
            tokens_input = ?output.tokens_input,
            tokens_output = ?output.tokens_output,
            "generateContent finished"
        );

        Ok(output)
    }
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

/// generateContent response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}
