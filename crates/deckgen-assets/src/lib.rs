//! Asset providers and the concurrent enrichment engine
//!
//! Images come from one of three providers behind the [`AssetProvider`]
//! trait: Flux (submit-then-poll generation), OpenAI (synchronous
//! generation) or Pexels (stock photo search). Icons resolve against a
//! bundled local [`IconLibrary`]. The [`EnrichmentEngine`] fans all fetches
//! out under a global concurrency bound and writes results back by slot.

mod engine;
mod error;
mod flux;
mod icons;
mod openai_images;
mod pexels;
mod retry;
mod types;

pub use engine::{EnrichmentEngine, EnrichmentReport};
pub use error::AssetError;
pub use flux::FluxProvider;
pub use icons::IconLibrary;
pub use openai_images::OpenAiImageProvider;
pub use pexels::PexelsProvider;
pub use retry::RetryPolicy;
pub use types::{AssetProvider, ImageRequest};

use std::sync::Arc;

use deckgen_config::Config;

/// Select and build the image provider for one request
///
/// Precedence: an explicit request-level choice, then the configured
/// default, then derivation from which credential is present. A Flux key
/// selects Flux, an OpenAI key selects OpenAI generation, and with neither
/// the stock photo search is used.
///
/// # Errors
///
/// Returns `AssetError::Provider` for an unknown provider name or when the
/// HTTP client cannot be built. A missing API key is not a selection error;
/// it surfaces per asset at fetch time and downgrades to placeholders.
pub fn provider_for_request(
    config: &Config,
    explicit: Option<&str>,
) -> Result<Arc<dyn AssetProvider>, AssetError> {
    let choice = match explicit.or(config.images.provider.as_deref()) {
        Some(name) => name.to_string(),
        None => derive_provider(config),
    };

    match choice.as_str() {
        "flux" => Ok(Arc::new(FluxProvider::from_config(config)?)),
        "openai" => Ok(Arc::new(OpenAiImageProvider::from_config(config)?)),
        "pexels" => Ok(Arc::new(PexelsProvider::from_config(config)?)),
        unknown => Err(AssetError::Provider(format!(
            "unknown asset provider '{unknown}'. Supported providers: flux, openai, pexels."
        ))),
    }
}

fn derive_provider(config: &Config) -> String {
    if std::env::var(&config.images.flux.api_key_env).is_ok() {
        "flux".to_string()
    } else if std::env::var(&config.images.openai_api_key_env).is_ok() {
        "openai".to_string()
    } else {
        "pexels".to_string()
    }
}
