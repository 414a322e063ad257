//! Deck content generation with bounded regenerate-with-feedback
//!
//! One structured request produces the whole deck. When the builder rejects
//! the result, its complaints are appended to the next user prompt as
//! corrective text. Transport-level retries already happened inside the
//! backend, so a transport failure here aborts immediately; only validation
//! complaints earn another attempt.

use deckgen_config::DeckRequest;
use deckgen_llm::{GenerationRequest, LlmBackend, Message};
use deckgen_model::{Outline, Slide};
use deckgen_repair::Complaint;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::builder::{self, BuildError};
use crate::error::PipelineError;
use crate::{prompts, schema};

/// Attempts before validation complaints become fatal
pub(crate) const MAX_GENERATION_ATTEMPTS: u32 = 3;

/// How much of an unparseable response the error keeps
const RESPONSE_SNIPPET_CHARS: usize = 500;

/// Raw generated deck, before repair and typing
#[derive(Debug, Deserialize)]
struct RawDeck {
    title: String,
    #[serde(default)]
    notes: Option<String>,
    slides: Vec<Value>,
}

/// Fully validated generation result
#[derive(Debug)]
pub(crate) struct GeneratedDeck {
    pub title: String,
    pub notes: Option<String>,
    pub slides: Vec<Slide>,
}

/// Expand an outline into typed, validated slides
pub(crate) async fn generate_deck(
    backend: &dyn LlmBackend,
    model: &str,
    outline: &Outline,
    request: &DeckRequest,
) -> Result<GeneratedDeck, PipelineError> {
    let schema = schema::content_schema(request.mode, outline.slides.len());
    let system = prompts::content_system_prompt(request.mode);
    let mut corrections: Vec<String> = Vec::new();

    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let generation = GenerationRequest::new(
            model,
            vec![
                Message::system(system.clone()),
                Message::user(prompts::content_user_prompt(
                    outline,
                    &request.language,
                    &corrections,
                )),
            ],
        )
        .with_schema(schema.clone());

        let output = backend
            .generate(generation)
            .await
            .map_err(PipelineError::GenerationTransport)?;
        let raw = parse_deck(&output.text)?;

        let built = if raw.slides.is_empty() {
            Err(BuildError::Rejected(vec![Complaint::new(
                0,
                "the slides array is empty",
            )]))
        } else {
            builder::build_slides(raw.slides, request.mode)
        };

        match built {
            Ok(slides) => {
                debug!(attempt, slides = slides.len(), "deck content accepted");
                return Ok(GeneratedDeck {
                    title: raw.title,
                    notes: raw.notes,
                    slides,
                });
            }
            Err(BuildError::UnknownType(e)) => return Err(e.into()),
            Err(BuildError::Rejected(complaints)) => {
                warn!(
                    attempt,
                    complaints = complaints.len(),
                    "generated deck rejected, requesting corrections"
                );
                corrections = complaints.iter().map(ToString::to_string).collect();
            }
        }
    }

    Err(PipelineError::ContentValidationFailed {
        attempts: MAX_GENERATION_ATTEMPTS,
        complaints: corrections,
    })
}

fn parse_deck(text: &str) -> Result<RawDeck, PipelineError> {
    serde_json::from_str(text).map_err(|e| PipelineError::GenerationParse {
        message: e.to_string(),
        snippet: text.chars().take(RESPONSE_SNIPPET_CHARS).collect(),
    })
}
