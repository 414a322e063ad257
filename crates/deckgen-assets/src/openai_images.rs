//! Synchronous image generation via the OpenAI images endpoint

use async_trait::async_trait;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::AssetError;
use crate::types::{AssetProvider, ImageRequest};
use deckgen_config::Config;
use deckgen_redaction::redact;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MODEL: &str = "dall-e-3";

/// Single-request image generation, no polling
pub struct OpenAiImageProvider {
    client: reqwest::Client,
    api_key_env: String,
    size: String,
    quality: String,
}

impl OpenAiImageProvider {
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
            api_key_env: config.images.openai_api_key_env.clone(),
            size: config.images.openai_size.clone(),
            quality: config.images.openai_quality.clone(),
        })
    }
}

#[async_trait]
impl AssetProvider for OpenAiImageProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn fetch(&self, request: &ImageRequest) -> Result<Utf8PathBuf, AssetError> {
        let api_key = std::env::var(&self.api_key_env)
            .map_err(|_| AssetError::Auth(format!("{} is not set", self.api_key_env)))?;

        let body = GenerationBody {
            model: MODEL.to_string(),
            prompt: request.prompt.clone(),
            n: 1,
            size: self.size.clone(),
            quality: self.quality.clone(),
        };

        debug!(model = MODEL, size = %self.size, "Requesting image generation");

        let response = self
            .client
            .post(format!("{DEFAULT_BASE_URL}/images/generations"))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AssetError::Transport(redact(&e.to_string())))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AssetError::Auth(format!(
                "image generation rejected: {status}"
            )));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AssetError::RateLimited { attempts: 1 });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AssetError::Provider(format!(
                "image generation failed with status {status}: {}",
                redact(&text)
            )));
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| AssetError::Provider(format!("malformed generation response: {e}")))?;

        let url = parsed
            .data
            .first()
            .and_then(|d| d.url.clone())
            .ok_or_else(|| {
                AssetError::Provider("generation response carried no image URL".to_string())
            })?;

        let bytes = self
            .client
            .get(&url)
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

#[derive(Debug, Serialize)]
struct GenerationBody {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    quality: String,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}
