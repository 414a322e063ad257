//! Text-generation backend abstraction for multi-provider support
//!
//! A trait-based system for invoking language models over HTTP. Both
//! providers implement [`LlmBackend`], so the generation pipeline works with
//! any of them without knowing wire details.

mod error;
mod gemini;
pub(crate) mod http_client;
mod openai;
mod types;

pub use error::LlmError;
pub use types::{GenerationOutput, GenerationRequest, LlmBackend, Message, ResponseSchema, Role};

pub(crate) use gemini::GeminiBackend;
pub(crate) use openai::OpenAiBackend;

use deckgen_config::Config;

/// Create a text-generation backend from configuration
///
/// Supported providers:
///
/// - **`openai`**: OpenAI-compatible chat completions (the default)
/// - **`google`**: Gemini `generateContent`
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for an unknown provider name and
/// `LlmError::Misconfiguration` when provider settings are invalid, including
/// a missing API key environment variable.
pub fn backend_from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    match config.llm.provider.as_str() {
        "openai" => {
            let backend = OpenAiBackend::from_config(&config.llm)?;
            Ok(Box::new(backend))
        }
        "google" => {
            let backend = GeminiBackend::from_config(&config.llm)?;
            Ok(Box::new(backend))
        }
        unknown => Err(LlmError::Unsupported(format!(
            "unknown text-generation provider '{unknown}'. Supported providers: openai, google."
        ))),
    }
}
