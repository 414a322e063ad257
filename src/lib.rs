//! deckgen - Typed slide-deck generation with schema-constrained LLM output
//!
//! This crate turns a one-line prompt into a fully typed presentation: an
//! outline is planned first, the whole deck's content is generated against a
//! JSON schema assembled from the slide-type registry, malformed output is
//! repaired or regenerated with corrective feedback, and image and icon
//! slots are filled concurrently once all text exists.
//!
//! # Pipeline order
//!
//! A run moves through fixed stages, each gated on the previous one:
//!
//! 1. **Outline**: the deck title, slide count and per-slide topics are
//!    fixed before any content is written.
//! 2. **Content**: one structured request expands the outline into every
//!    slide. Validation complaints trigger up to two regenerations, each
//!    carrying the complaints as corrective feedback.
//! 3. **Build**: raw JSON becomes typed slides; indices come from array
//!    position, over-long text is trimmed, unregistered slide types abort.
//! 4. **Enrichment**: image and icon fetches run concurrently under a
//!    bounded limit. Failed slots downgrade to placeholders and are
//!    reported as warnings; they never fail the run.
//!
//! # Quick Start
//!
//! ```no_run
//! use deckgen::{Config, DeckRequest, Pipeline};
//!
//! # async fn example() -> Result<(), deckgen::PipelineError> {
//! let pipeline = Pipeline::from_config(Config::default())?;
//! let request = DeckRequest::new("the history of coffee", "decks/coffee/assets")
//!     .with_slides(8)
//!     .with_language("English");
//! let output = pipeline.run(&request).await?;
//!
//! println!(
//!     "{} slides, {} assets fetched, {} placeholders",
//!     output.presentation.len(),
//!     output.report.fetched,
//!     output.report.placeholders,
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Text generation needs a provider API key (`OPENAI_API_KEY` by default).
//! Image providers are optional: without credentials every image slot falls
//! back to the configured placeholder.

mod builder;
mod content;
mod error;
mod outline;
mod pipeline;
mod prompts;
mod schema;

pub use error::PipelineError;
pub use pipeline::{DeckOutput, Pipeline, generate};

// The vocabulary types callers hold on both sides of a run.
pub use deckgen_config::{Config, DeckRequest, MAX_SLIDES, MIN_SLIDES};
pub use deckgen_model::{
    Chart, ChartKind, ContentItem, DensityMode, Outline, OutlineSlide, Presentation, Series,
    Slide, SlideBody, SlideContent,
};

// Extension points and their supporting types.
pub use deckgen_assets::{AssetError, AssetProvider, EnrichmentReport, ImageRequest};
pub use deckgen_llm::{GenerationOutput, GenerationRequest, LlmBackend, LlmError, Message};
pub use deckgen_registry::{SlideTypeSpec, UnknownSlideType, all_specs, spec_for};
