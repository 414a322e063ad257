//! Process configuration and request-scoped options
//!
//! Two layers, deliberately separate:
//!
//! - [`Config`] is process-wide and read-only once constructed: provider
//!   credentials (as environment variable names, resolved when a backend is
//!   built), endpoints, retry knobs, the asset concurrency bound, and
//!   placeholder paths. Loadable from TOML with environment overrides.
//! - [`DeckRequest`] is request-scoped: everything that may differ between
//!   two concurrent generation calls (prompt, slide count, language, density
//!   mode, provider/model overrides) travels in this value, never in process
//!   state.

use camino::Utf8PathBuf;
use deckgen_model::DensityMode;
use serde::Deserialize;

/// Slide count floor for a deck request
pub const MIN_SLIDES: usize = 3;
/// Slide count ceiling for a deck request
pub const MAX_SLIDES: usize = 20;
/// Slide count used when the caller does not specify one
pub const DEFAULT_SLIDES: usize = 8;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Text-generation backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// Backend provider: `openai` (or any OpenAI-compatible endpoint) or
    /// `google`
    pub provider: String,
    /// Default model; a request-level override wins
    pub model: Option<String>,
    /// Custom base URL for OpenAI-compatible servers
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            base_url: None,
            api_key_env: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Flux (submit-then-poll) provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FluxConfig {
    /// Model endpoint path segment, e.g. `flux-dev` or `flux-pro-1.1`
    pub endpoint: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Seconds between result polls
    pub poll_interval_secs: u64,
    /// Wall-clock budget for one job, in seconds
    pub poll_budget_secs: u64,
}

impl Default for FluxConfig {
    fn default() -> Self {
        Self {
            endpoint: "flux-dev".to_string(),
            api_key_env: "BFL_API_KEY".to_string(),
            poll_interval_secs: 2,
            poll_budget_secs: 180,
        }
    }
}

/// Image/icon provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// Default provider; overridden per request, else derived from which
    /// credential is configured
    pub provider: Option<String>,
    pub flux: FluxConfig,
    /// Environment variable holding the Pexels API key
    pub pexels_api_key_env: String,
    /// Environment variable holding the OpenAI API key for image generation
    pub openai_api_key_env: String,
    /// Generated image size for synchronous generation
    pub openai_size: String,
    /// Generated image quality, `standard` or `hd`
    pub openai_quality: String,
    /// Directory holding the bundled icon library
    pub icon_dir: Option<Utf8PathBuf>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: None,
            flux: FluxConfig::default(),
            pexels_api_key_env: "PEXELS_API_KEY".to_string(),
            openai_api_key_env: "OPENAI_API_KEY".to_string(),
            openai_size: "1024x1024".to_string(),
            openai_quality: "standard".to_string(),
            icon_dir: None,
        }
    }
}

/// Asset enrichment engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    /// Maximum simultaneously in-flight asset fetches
    pub max_concurrent_fetches: usize,
    /// Per-asset-job timeout, in seconds
    pub job_timeout_secs: u64,
    /// Submit retry attempts for rate-limited providers
    pub retry_max_attempts: u32,
    /// Base delay for exponential submit backoff, in milliseconds
    pub retry_base_delay_ms: u64,
    /// Bundled placeholder substituted for failed image fetches
    pub placeholder_image: Utf8PathBuf,
    /// Bundled placeholder substituted for failed icon lookups
    pub placeholder_icon: Utf8PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            job_timeout_secs: 300,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
            placeholder_image: Utf8PathBuf::from("assets/placeholder.jpg"),
            placeholder_icon: Utf8PathBuf::from("assets/placeholder-icon.png"),
        }
    }
}

/// Process-wide configuration, read-only once constructed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub llm: LlmConfig,
    pub images: ImageConfig,
    pub assets: AssetConfig,
}

impl Config {
    /// Parse a configuration from TOML text
    ///
    /// Absent tables and fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Invalid` when validation fails.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from defaults plus `DECKGEN_*` env overrides
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when an override fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(provider) = std::env::var("DECKGEN_LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("DECKGEN_LLM_MODEL") {
            config.llm.model = Some(model);
        }
        if let Ok(base_url) = std::env::var("DECKGEN_LLM_BASE_URL") {
            config.llm.base_url = Some(base_url);
        }
        if let Ok(provider) = std::env::var("DECKGEN_IMAGE_PROVIDER") {
            config.images.provider = Some(provider);
        }
        if let Ok(bound) = std::env::var("DECKGEN_MAX_CONCURRENT_FETCHES") {
            config.assets.max_concurrent_fetches = bound
                .parse()
                .map_err(|_| ConfigError::Invalid(format!(
                    "DECKGEN_MAX_CONCURRENT_FETCHES must be an integer, got '{bound}'"
                )))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.max_concurrent_fetches == 0 {
            return Err(ConfigError::Invalid(
                "assets.max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if self.assets.retry_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "assets.retry_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.images.flux.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "images.flux.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.images.flux.poll_budget_secs < self.images.flux.poll_interval_secs {
            return Err(ConfigError::Invalid(
                "images.flux.poll_budget_secs must cover at least one poll interval".to_string(),
            ));
        }
        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::Invalid(format!(
                    "llm.temperature must be within 0.0..=2.0, got {temperature}"
                )));
            }
        }
        Ok(())
    }

    /// Minimal configuration for tests: defaults, nothing read from the
    /// process environment.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self::default()
    }
}

/// Request-scoped options for one deck generation
///
/// Every per-request override travels here. Two concurrent requests with
/// different modes or providers never observe each other.
#[derive(Debug, Clone)]
pub struct DeckRequest {
    /// What the deck should be about
    pub prompt: String,
    /// Requested slide count, clamped to 3–20
    pub n_slides: usize,
    /// Output language for all generated text
    pub language: String,
    pub mode: DensityMode,
    /// Optional document-derived summary to ground the outline
    pub summary: Option<String>,
    /// Explicit asset provider selection; wins over credential derivation
    pub image_provider: Option<String>,
    /// Per-request model override for text generation
    pub model: Option<String>,
    /// Aspect ratio hint forwarded to generative image providers
    pub aspect_ratio: String,
    /// Directory downloaded assets are written into
    pub asset_dir: Utf8PathBuf,
}

impl DeckRequest {
    /// Create a request with defaults: 8 slides, English, normal mode
    #[must_use]
    pub fn new(prompt: impl Into<String>, asset_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            n_slides: DEFAULT_SLIDES,
            language: "English".to_string(),
            mode: DensityMode::default(),
            summary: None,
            image_provider: None,
            model: None,
            aspect_ratio: "16:9".to_string(),
            asset_dir: asset_dir.into(),
        }
    }

    /// Set the slide count, clamping to the supported 3–20 range
    #[must_use]
    pub fn with_slides(mut self, n_slides: usize) -> Self {
        self.n_slides = n_slides.clamp(MIN_SLIDES, MAX_SLIDES);
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DensityMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_image_provider(mut self, provider: impl Into<String>) -> Self {
        self.image_provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    /// Serializes tests that mutate process environment variables
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.assets.max_concurrent_fetches, 8);
        assert_eq!(config.images.flux.endpoint, "flux-dev");
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [llm]
            provider = "google"
            model = "gemini-2.0-flash"

            [assets]
            max_concurrent_fetches = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.provider, "google");
        assert_eq!(config.llm.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(config.assets.max_concurrent_fetches, 4);
        // Untouched table keeps its defaults
        assert_eq!(config.images.flux.poll_interval_secs, 2);
    }

    #[test]
    fn test_unknown_toml_keys_are_rejected() {
        let result = Config::from_toml_str(
            r#"
            [llm]
            providr = "openai"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Config::from_toml_str(
            r#"
            [assets]
            max_concurrent_fetches = 0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_poll_budget_must_cover_one_interval() {
        let result = Config::from_toml_str(
            r#"
            [images.flux]
            poll_interval_secs = 10
            poll_budget_secs = 5
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_temperature_range_enforced() {
        let result = Config::from_toml_str(
            r#"
            [llm]
            temperature = 3.5
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_env_overrides_apply() {
        let _guard = env_lock().lock().unwrap();
        // SAFETY: single-threaded within the env lock
        unsafe {
            std::env::set_var("DECKGEN_LLM_PROVIDER", "google");
            std::env::set_var("DECKGEN_MAX_CONCURRENT_FETCHES", "2");
        }
        let config = Config::from_env().unwrap();
        unsafe {
            std::env::remove_var("DECKGEN_LLM_PROVIDER");
            std::env::remove_var("DECKGEN_MAX_CONCURRENT_FETCHES");
        }
        assert_eq!(config.llm.provider, "google");
        assert_eq!(config.assets.max_concurrent_fetches, 2);
    }

    #[test]
    fn test_env_override_rejects_non_numeric_bound() {
        let _guard = env_lock().lock().unwrap();
        unsafe {
            std::env::set_var("DECKGEN_MAX_CONCURRENT_FETCHES", "many");
        }
        let result = Config::from_env();
        unsafe {
            std::env::remove_var("DECKGEN_MAX_CONCURRENT_FETCHES");
        }
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_deck_request_defaults() {
        let request = DeckRequest::new("Quarterly review", "/tmp/assets");
        assert_eq!(request.n_slides, DEFAULT_SLIDES);
        assert_eq!(request.language, "English");
        assert_eq!(request.mode, DensityMode::Normal);
        assert_eq!(request.aspect_ratio, "16:9");
    }

    #[test]
    fn test_deck_request_clamps_slide_count() {
        let request = DeckRequest::new("p", "/tmp").with_slides(1);
        assert_eq!(request.n_slides, MIN_SLIDES);
        let request = DeckRequest::new("p", "/tmp").with_slides(50);
        assert_eq!(request.n_slides, MAX_SLIDES);
        let request = DeckRequest::new("p", "/tmp").with_slides(12);
        assert_eq!(request.n_slides, 12);
    }
}
