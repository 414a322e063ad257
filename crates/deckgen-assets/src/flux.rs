//! Flux image generation over the submit-then-poll protocol
//!
//! A job is submitted with the prompt and aspect ratio, the service answers
//! with a request id and a polling URL, and the adapter polls that URL until
//! the job reports ready, fails, or the poll budget runs out. Rate-limited
//! submits are retried with exponential backoff; authentication and credit
//! failures are terminal on the first response.

use async_trait::async_trait;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AssetError;
use crate::retry::RetryPolicy;
use crate::types::{AssetProvider, ImageRequest};
use deckgen_config::Config;
use deckgen_redaction::redact;

const DEFAULT_BASE_URL: &str = "https://api.bfl.ai/v1";

/// Appended to every generation prompt before submit
const QUALITY_SUFFIX: &str = ", high quality, professional, sharp focus, detailed";

/// One HTTP exchange as the adapter sees it
#[derive(Debug, Clone)]
pub(crate) struct WireResponse {
    pub status: u16,
    pub text: String,
}

/// Wire surface of the image service, factored out so tests can drive the
/// submit/poll/download cycle without a network.
#[async_trait]
pub(crate) trait FluxTransport: Send + Sync {
    async fn submit(&self, endpoint: &str, body: &SubmitBody) -> Result<WireResponse, AssetError>;
    async fn poll(&self, polling_url: &str, request_id: &str) -> Result<WireResponse, AssetError>;
    async fn download(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// Flux provider, generic over the transport for testability
pub struct FluxProvider<T: FluxTransport = HttpTransport> {
    transport: T,
    endpoint: String,
    retry: RetryPolicy,
    poll_interval: Duration,
    poll_budget: Duration,
}

impl FluxProvider<HttpTransport> {
    /// Build a provider from the process configuration
    ///
    /// The API key is resolved lazily at fetch time, so a missing key
    /// surfaces as a per-asset failure rather than aborting the deck.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::Provider` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, AssetError> {
        let transport = HttpTransport::new(
            DEFAULT_BASE_URL.to_string(),
            config.images.flux.api_key_env.clone(),
        )?;
        Ok(Self {
            transport,
            endpoint: config.images.flux.endpoint.clone(),
            retry: RetryPolicy::from_config(&config.assets),
            poll_interval: Duration::from_secs(config.images.flux.poll_interval_secs),
            poll_budget: Duration::from_secs(config.images.flux.poll_budget_secs),
        })
    }
}

impl<T: FluxTransport> FluxProvider<T> {
    #[cfg(test)]
    fn with_transport(transport: T, retry: RetryPolicy) -> Self {
        Self {
            transport,
            endpoint: "flux-dev".to_string(),
            retry,
            poll_interval: Duration::from_secs(2),
            poll_budget: Duration::from_secs(180),
        }
    }

    /// Submit the job, retrying on rate limits
    async fn submit_job(&self, body: &SubmitBody) -> Result<SubmitReceipt, AssetError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = self.transport.submit(&self.endpoint, body).await?;
            match response.status {
                200 => {
                    let receipt: SubmitReceipt =
                        serde_json::from_str(&response.text).map_err(|e| {
                            AssetError::Provider(format!("malformed submit response: {e}"))
                        })?;
                    return Ok(receipt);
                }
                429 => {
                    if attempt >= self.retry.max_attempts {
                        return Err(AssetError::RateLimited { attempts: attempt });
                    }
                    let wait = self.retry.delay_for(attempt - 1);
                    warn!(attempt, wait_secs = wait.as_secs(), "Rate limited, backing off");
                    tokio::time::sleep(wait).await;
                }
                402 => {
                    return Err(AssetError::Auth(format!(
                        "insufficient credits: {}",
                        redact(&response.text)
                    )));
                }
                403 => {
                    return Err(AssetError::Auth(format!(
                        "authentication rejected (403): {}",
                        redact(&response.text)
                    )));
                }
                status => {
                    return Err(AssetError::Provider(format!(
                        "submit failed with status {status}: {}",
                        redact(&response.text)
                    )));
                }
            }
        }
    }

    /// Poll until ready, failed, or the budget is exhausted
    async fn await_result(&self, receipt: &SubmitReceipt) -> Result<String, AssetError> {
        let max_polls = self.poll_budget.as_secs() / self.poll_interval.as_secs().max(1);
        for _ in 0..max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .transport
                .poll(&receipt.polling_url, &receipt.id)
                .await?;
            if response.status != 200 {
                continue;
            }

            let poll: PollStatus = serde_json::from_str(&response.text)
                .map_err(|e| AssetError::Provider(format!("malformed poll response: {e}")))?;

            match poll.status.as_str() {
                "Ready" => {
                    return poll.result.and_then(|r| r.sample).ok_or_else(|| {
                        AssetError::Provider("ready response carried no image URL".to_string())
                    });
                }
                "Error" | "Failed" => {
                    let reason = poll.error.unwrap_or_else(|| "unknown error".to_string());
                    return Err(AssetError::Provider(format!("generation failed: {reason}")));
                }
                _ => {}
            }
        }
        Err(AssetError::Timeout {
            budget: self.poll_budget,
        })
    }
}

#[async_trait]
impl<T: FluxTransport> AssetProvider for FluxProvider<T> {
    fn name(&self) -> &'static str {
        "flux"
    }

    async fn fetch(&self, request: &ImageRequest) -> Result<Utf8PathBuf, AssetError> {
        let body = SubmitBody {
            prompt: format!("{}{QUALITY_SUFFIX}", request.prompt),
            aspect_ratio: request.aspect_ratio.clone(),
        };

        let receipt = self.submit_job(&body).await?;
        debug!(request_id = %receipt.id, endpoint = %self.endpoint, "Image job submitted");

        let image_url = self.await_result(&receipt).await?;
        let bytes = self.transport.download(&image_url).await?;

        let path = request.output_dir.join(format!("{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path, "Image downloaded");
        Ok(path)
    }
}

/// Real transport over reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key_env: String,
}

impl HttpTransport {
    fn new(base_url: String, api_key_env: String) -> Result<Self, AssetError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .use_rustls_tls()
            .build()
            .map_err(|e| AssetError::Provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key_env,
        })
    }

    fn api_key(&self) -> Result<String, AssetError> {
        std::env::var(&self.api_key_env)
            .map_err(|_| AssetError::Auth(format!("{} is not set", self.api_key_env)))
    }
}

fn transport_error(e: &reqwest::Error) -> AssetError {
    AssetError::Transport(redact(&e.to_string()))
}

#[async_trait]
impl FluxTransport for HttpTransport {
    async fn submit(&self, endpoint: &str, body: &SubmitBody) -> Result<WireResponse, AssetError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .header("accept", "application/json")
            .header("x-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| transport_error(&e))?;
        Ok(WireResponse { status, text })
    }

    async fn poll(&self, polling_url: &str, request_id: &str) -> Result<WireResponse, AssetError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(polling_url)
            .header("accept", "application/json")
            .header("x-key", api_key)
            .query(&[("id", request_id)])
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| transport_error(&e))?;
        Ok(WireResponse { status, text })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        if !response.status().is_success() {
            return Err(AssetError::Provider(format!(
                "image download failed with status {}",
                response.status()
            )));
        }
        let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
        Ok(bytes.to_vec())
    }
}

/// Submit request body
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmitBody {
    pub prompt: String,
    pub aspect_ratio: String,
}

/// Successful submit response
#[derive(Debug, Deserialize)]
struct SubmitReceipt {
    id: String,
    polling_url: String,
}

/// Poll response
#[derive(Debug, Deserialize)]
struct PollStatus {
    status: String,
    result: Option<PollResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PollResult {
    sample: Option<String>,
}
