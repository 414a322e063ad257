//! Outline generation, the first model call of a run
//!
//! The outline fixes the deck title, the slide count and the per-slide
//! topics before any content is written. Content generation never changes
//! these decisions; it only expands them.

use deckgen_config::DeckRequest;
use deckgen_llm::{GenerationRequest, LlmBackend, Message};
use deckgen_model::Outline;
use tracing::debug;

use crate::error::PipelineError;
use crate::{prompts, schema};

/// Generate the deck outline
///
/// Any failure here aborts the run: there is nothing to fall back to and
/// nothing downstream can start without an outline.
pub(crate) async fn generate_outline(
    backend: &dyn LlmBackend,
    model: &str,
    request: &DeckRequest,
) -> Result<Outline, PipelineError> {
    let generation = GenerationRequest::new(
        model,
        vec![
            Message::system(prompts::OUTLINE_SYSTEM_PROMPT),
            Message::user(prompts::outline_user_prompt(request)),
        ],
    )
    .with_schema(schema::outline_schema(request.n_slides));

    let output = backend.generate(generation).await.map_err(|e| {
        PipelineError::OutlineGenerationFailed {
            reason: "the outline request failed".to_owned(),
            source: Some(e),
        }
    })?;

    let outline: Outline = serde_json::from_str(&output.text).map_err(|e| {
        PipelineError::OutlineGenerationFailed {
            reason: format!("the outline response was not valid JSON: {e}"),
            source: None,
        }
    })?;

    if outline.slides.is_empty() {
        return Err(PipelineError::OutlineGenerationFailed {
            reason: "the outline contained no slides".to_owned(),
            source: None,
        });
    }

    debug!(
        provider = %output.provider,
        model = %output.model_used,
        slides = outline.slides.len(),
        title = %outline.title,
        "outline generated"
    );
    Ok(outline)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use deckgen_llm::{GenerationOutput, LlmError};
    use serde_json::json;
    use std::sync::Mutex;

    use super::*;

    /// Backend double that answers with a fixed body and records requests
    struct CannedBackend {
        body: String,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl CannedBackend {
        fn answering(body: impl Into<String>) -> Self {
            Self {
                body: body.into(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for CannedBackend {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, LlmError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request);
            }
            Ok(GenerationOutput::new(self.body.clone(), "test", "test-model"))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl LlmBackend for FailingBackend {
        async fn generate(&self, _: GenerationRequest) -> Result<GenerationOutput, LlmError> {
            Err(LlmError::Outage("upstream 503".to_owned()))
        }
    }

    fn outline_json() -> String {
        json!({
            "title": "Solar Power at Home",
            "slides": [
                { "title": "Why solar now", "points": ["prices", "independence"] },
                { "title": "Costs", "points": ["upfront", "amortized"] },
                { "title": "Next steps", "points": ["survey", "quote"] },
            ],
            "notes": "Keep it practical",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_outline_parses_and_pins_schema() {
        let backend = CannedBackend::answering(outline_json());
        let mut request = DeckRequest::new("solar power", "/tmp/assets");
        request = request.with_slides(3);

        let outline = generate_outline(&backend, "gpt-test", &request)
            .await
            .unwrap();
        assert_eq!(outline.title, "Solar Power at Home");
        assert_eq!(outline.slides.len(), 3);
        assert_eq!(outline.notes.as_deref(), Some("Keep it practical"));

        let seen = backend.seen.lock().unwrap();
        let schema = seen[0].response_schema.as_ref().unwrap();
        assert_eq!(schema.name, "deck_outline");
        assert_eq!(schema.schema["properties"]["slides"]["minItems"], json!(3));
    }

    #[tokio::test]
    async fn test_transport_failure_carries_source() {
        let request = DeckRequest::new("solar power", "/tmp/assets");
        let err = generate_outline(&FailingBackend, "gpt-test", &request)
            .await
            .unwrap_err();
        match err {
            PipelineError::OutlineGenerationFailed { source, .. } => {
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_response_fails_without_source() {
        let backend = CannedBackend::answering("Sure! Here is an outline:");
        let request = DeckRequest::new("solar power", "/tmp/assets");
        let err = generate_outline(&backend, "gpt-test", &request)
            .await
            .unwrap_err();
        match err {
            PipelineError::OutlineGenerationFailed { reason, source } => {
                assert!(reason.contains("not valid JSON"));
                assert!(source.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_outline_is_rejected() {
        let backend =
            CannedBackend::answering(json!({ "title": "Empty", "slides": [] }).to_string());
        let request = DeckRequest::new("solar power", "/tmp/assets");
        let err = generate_outline(&backend, "gpt-test", &request)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no slides"));
    }
}
