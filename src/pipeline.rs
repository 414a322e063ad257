//! End-to-end deck generation
//!
//! A run is strictly ordered: outline, then the whole deck's content, then
//! typed slide construction, and only then asset enrichment. Assets never
//! influence text, and a deck either completes with every slide built or the
//! run fails; individual asset failures downgrade to placeholders and are
//! reported as warnings. Dropping the future returned by [`Pipeline::run`]
//! cancels the whole run, in-flight asset fetches included.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use deckgen_assets::{EnrichmentEngine, EnrichmentReport, IconLibrary, provider_for_request};
use deckgen_config::{Config, ConfigError, DeckRequest};
use deckgen_llm::LlmBackend;
use deckgen_model::Presentation;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::{content, outline};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_GOOGLE_MODEL: &str = "gemini-1.5-flash";

/// A finished run: the deck plus the enrichment tally
#[derive(Debug)]
pub struct DeckOutput {
    pub presentation: Presentation,
    pub report: EnrichmentReport,
}

/// Deck generation pipeline, reusable across requests
///
/// The pipeline owns the text backend and the process configuration.
/// Everything request-specific arrives through [`DeckRequest`], so one
/// pipeline value serves concurrent runs.
pub struct Pipeline {
    backend: Box<dyn LlmBackend>,
    config: Config,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline with the text backend the configuration names
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the backend cannot be built, for
    /// example when the named provider is unknown or its API key variable is
    /// unset.
    pub fn from_config(config: Config) -> Result<Self, PipelineError> {
        let backend = deckgen_llm::backend_from_config(&config)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self { backend, config })
    }

    /// Build a pipeline around an explicit backend
    ///
    /// The seam for callers that construct their own [`LlmBackend`], test
    /// doubles included.
    #[must_use]
    pub fn with_backend(config: Config, backend: Box<dyn LlmBackend>) -> Self {
        Self { backend, config }
    }

    /// Generate one deck
    ///
    /// # Errors
    ///
    /// Returns an error when the outline or content step fails, when the
    /// generator emits an unregistered slide type, when validation
    /// complaints survive every regeneration attempt, or when the asset
    /// directory cannot be created. Asset fetch failures are not errors;
    /// they appear as placeholders plus [`EnrichmentReport`] warnings.
    pub async fn run(&self, request: &DeckRequest) -> Result<DeckOutput, PipelineError> {
        let started = Instant::now();
        let model = self.resolve_model(request);

        info!(
            model,
            slides = request.n_slides,
            mode = request.mode.as_str(),
            language = %request.language,
            "starting deck generation"
        );

        let outline = outline::generate_outline(self.backend.as_ref(), model, request).await?;
        let deck = content::generate_deck(self.backend.as_ref(), model, &outline, request).await?;

        // The outline owns the deck identity; generated deck-level notes
        // only fill in when the outline carried none.
        let mut presentation = Presentation {
            title: outline.title,
            slides: deck.slides,
            language: request.language.clone(),
            mode: request.mode,
            summary: request.summary.clone(),
            notes: outline.notes.or(deck.notes),
            created_at: Utc::now(),
        };

        tokio::fs::create_dir_all(&request.asset_dir).await?;

        let provider = provider_for_request(&self.config, request.image_provider.as_deref())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let icons = self.open_icon_library();
        let engine = EnrichmentEngine::new(provider, icons, &self.config.assets);
        let report = engine.enrich(&mut presentation, request).await;

        info!(
            slides = presentation.len(),
            fetched = report.fetched,
            placeholders = report.placeholders,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "deck generation finished"
        );
        Ok(DeckOutput {
            presentation,
            report,
        })
    }

    /// Request override, then process config, then the provider's default
    fn resolve_model<'a>(&'a self, request: &'a DeckRequest) -> &'a str {
        request
            .model
            .as_deref()
            .or(self.config.llm.model.as_deref())
            .unwrap_or(match self.config.llm.provider.as_str() {
                "google" => DEFAULT_GOOGLE_MODEL,
                _ => DEFAULT_OPENAI_MODEL,
            })
    }

    /// Open the configured icon directory, if any
    ///
    /// An unreadable directory is an asset concern, not a run-fatal one:
    /// icon slots fall back to placeholders like any other failed fetch.
    fn open_icon_library(&self) -> Option<Arc<IconLibrary>> {
        let dir = self.config.images.icon_dir.as_ref()?;
        match IconLibrary::open(dir) {
            Ok(library) => Some(Arc::new(library)),
            Err(e) => {
                warn!(dir = %dir, error = %e, "icon directory unavailable, icons will fall back to placeholders");
                None
            }
        }
    }
}

/// Generate one deck with a throwaway pipeline
///
/// Convenience for callers that do not reuse the pipeline across requests.
///
/// # Errors
///
/// Same failure modes as [`Pipeline::from_config`] and [`Pipeline::run`].
pub async fn generate(config: Config, request: &DeckRequest) -> Result<DeckOutput, PipelineError> {
    Pipeline::from_config(config)?.run(request).await
}
