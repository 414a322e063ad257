//! Core types for the asset provider abstraction

use async_trait::async_trait;
use camino::Utf8PathBuf;

use crate::error::AssetError;

/// One image to obtain, by generation or search
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Prompt for generative providers, search query for search providers
    pub prompt: String,
    /// Aspect ratio hint, ignored by providers that cannot honor it
    pub aspect_ratio: String,
    /// Directory the fetched file is written into
    pub output_dir: Utf8PathBuf,
}

impl ImageRequest {
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        aspect_ratio: impl Into<String>,
        output_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: aspect_ratio.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// Trait for image provider implementations
///
/// Providers fetch one image per call and write it under
/// `request.output_dir`, returning the path. The enrichment engine treats
/// every error as non-fatal. Test doubles implement this trait directly.
#[async_trait]
pub trait AssetProvider: Send + Sync {
    /// Short provider name for logs and warnings
    fn name(&self) -> &'static str;

    /// Obtain one image for the request
    ///
    /// # Errors
    ///
    /// Returns `AssetError` for auth failures, rate limiting, provider
    /// errors, timeouts and transport failures.
    async fn fetch(&self, request: &ImageRequest) -> Result<Utf8PathBuf, AssetError>;
}
