//! Stock photo search via the Pexels API
//!
//! The default provider when no generation credential is configured. Search
//! queries go out verbatim; the first large-size result wins.

use async_trait::async_trait;
use camino::Utf8PathBuf;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::AssetError;
use crate::types::{AssetProvider, ImageRequest};
use deckgen_config::Config;
use deckgen_redaction::redact;

const SEARCH_URL: &str = "https://api.pexels.com/v1/search";

/// Image search against the Pexels photo library
pub struct PexelsProvider {
    client: reqwest::Client,
    api_key_env: String,
}

impl PexelsProvider {
    /// Build a provider from the process configuration
    ///
    /// # Errors
    ///
    /// Returns `AssetError::Provider` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, AssetError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .use_rustls_tls()
            .build()
            .map_err(|e| AssetError::Provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key_env: config.images.pexels_api_key_env.clone(),
        })
    }
}

#[async_trait]
impl AssetProvider for PexelsProvider {
    fn name(&self) -> &'static str {
        "pexels"
    }

    async fn fetch(&self, request: &ImageRequest) -> Result<Utf8PathBuf, AssetError> {
        let api_key = std::env::var(&self.api_key_env)
            .map_err(|_| AssetError::Auth(format!("{} is not set", self.api_key_env)))?;

        debug!(query = %request.prompt, "Searching photo library");

        let response = self
            .client
            .get(SEARCH_URL)
            .header("Authorization", api_key)
            .query(&[
                ("query", request.prompt.as_str()),
                ("per_page", "1"),
                ("size", "large"),
            ])
            .send()
            .await
            .map_err(|e| AssetError::Transport(redact(&e.to_string())))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AssetError::Auth(format!("search rejected: {status}")));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AssetError::RateLimited { attempts: 1 });
        }
        if !status.is_success() {
            return Err(AssetError::Provider(format!(
                "search failed with status {status}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AssetError::Provider(format!("malformed search response: {e}")))?;

        let photo_url = parsed
            .photos
            .first()
            .map(|p| p.src.large.clone())
            .ok_or_else(|| AssetError::NotFound(request.prompt.clone()))?;

        let bytes = self
            .client
            .get(&photo_url)
            .send()
            .await
            .map_err(|e| AssetError::Transport(redact(&e.to_string())))?
            .bytes()
            .await
            .map_err(|e| AssetError::Transport(redact(&e.to_string())))?;

        let path = request.output_dir.join(format!("{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    large: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_extracts_large_source() {
        let raw = r#"{
            "page": 1,
            "photos": [
                {"id": 7, "src": {"original": "o.jpg", "large": "https://img.example/l.jpg"}}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.photos[0].src.large, "https://img.example/l.jpg");
    }

    #[test]
    fn test_empty_results_parse_as_no_photos() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(parsed.photos.is_empty());
    }
}
