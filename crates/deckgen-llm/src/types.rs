//! Core types for the text-generation backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LlmError;

/// Per-request timeout used when the caller does not set one
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions
    System,
    /// User input
    User,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// A named JSON schema the provider must constrain its output to
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    /// Schema name, forwarded to providers whose wire format requires one
    pub name: String,
    /// The JSON schema document itself
    pub schema: serde_json::Value,
}

impl ResponseSchema {
    #[must_use]
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Input to one text-generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier, already resolved from request or process config
    pub model: String,
    /// Timeout for this call
    pub timeout: Duration,
    /// Ordered conversation messages
    pub messages: Vec<Message>,
    /// Schema for constrained decoding, when set
    pub response_schema: Option<ResponseSchema>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            messages,
            response_schema: None,
            temperature: None,
            max_tokens: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Result of one text-generation call
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Raw response text from the provider
    pub text: String,
    /// Provider that produced it (e.g. "openai", "google")
    pub provider: String,
    /// Model that was actually used
    pub model_used: String,
    /// Input tokens consumed, if reported
    pub tokens_input: Option<u64>,
    /// Output tokens generated, if reported
    pub tokens_output: Option<u64>,
}

impl GenerationOutput {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
        }
    }
}

/// Trait for text-generation backend implementations
///
/// Both HTTP providers implement this trait, so callers work with any
/// provider without knowing wire details. Test doubles implement it directly.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate text for the given request
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for any failure: transport errors, provider errors
    /// (auth, rate limits, outages) and timeouts.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::system("follow the rules");
        assert_eq!(msg.role, Role::System);
        let msg = Message::user("make a deck");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "make a deck");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::System).unwrap();
        assert_eq!(json, "\"system\"");
        let json = serde_json::to_string(&Role::User).unwrap();
        assert_eq!(json, "\"user\"");
    }

    #[test]
    fn test_request_builder_defaults() {
        let request = GenerationRequest::new("gpt-4o", vec![Message::user("hi")]);
        assert_eq!(request.timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(request.response_schema.is_none());

        let request = request
            .with_timeout(Duration::from_secs(30))
            .with_temperature(0.4)
            .with_schema(ResponseSchema::new("deck", serde_json::json!({"type": "object"})));
        assert_eq!(request.timeout, Duration::from_secs(30));
        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.response_schema.unwrap().name, "deck");
    }
}
