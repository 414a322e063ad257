//! Shared HTTP client infrastructure for the HTTP text-generation providers
//!
//! One `reqwest::Client` configured per backend, reused across calls, with
//! timeout and retry policies applied uniformly to every provider.

use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::LlmError;
use deckgen_redaction::redact;

/// Ceiling on any single HTTP request (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry attempts for 5xx and network failures
const MAX_RETRIES: u32 = 2;

/// Backoff unit; attempt n sleeps n times this
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Shared HTTP client for text-generation providers
///
/// Provides connection reuse, a per-request timeout capped by a global
/// maximum, retry with linear backoff for 5xx/network failures, and TLS via
/// rustls.
#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    /// Create a client with the default timeout ceiling
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be built.
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    /// Create a client with a custom timeout ceiling
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be built.
    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .use_rustls_tls()
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    /// Execute a request with timeout and retry policy
    ///
    /// The effective timeout is `min(request_timeout, max_timeout)`. 5xx and
    /// network failures are retried up to twice with backoff; 4xx failures
    /// are mapped and returned immediately.
    ///
    /// # Errors
    ///
    /// - `LlmError::Auth` for 401/403
    /// - `LlmError::RateLimited` for 429
    /// - `LlmError::Outage` for 5xx after retries
    /// - `LlmError::Timeout` for timeouts
    /// - `LlmError::Transport` for other 4xx and network errors after retries
    pub async fn execute_with_retry(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| {
                    LlmError::Transport("failed to clone request for retry".to_string())
                })?
                .timeout(effective_timeout)
                .build()
                .map_err(|e| LlmError::Transport(format!("failed to build request: {e}")))?;

            debug!(
                provider = provider_name,
                attempt = attempt,
                timeout_secs = effective_timeout.as_secs(),
                "Executing HTTP request"
            );

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_client_error() {
                        return Err(map_client_error(status, provider_name));
                    }

                    if status.is_server_error() {
                        let error = LlmError::Outage(format!(
                            "{provider_name} returned server error: {status}"
                        ));

                        if attempt <= MAX_RETRIES {
                            warn!(
                                provider = provider_name,
                                attempt = attempt,
                                status = status.as_u16(),
                                "Server error, will retry"
                            );
                            tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                            continue;
                        }

                        return Err(error);
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(LlmError::Timeout {
                            duration: effective_timeout,
                        });
                    }

                    let error = LlmError::Transport(format!(
                        "{provider_name} request failed: {}",
                        redact(&e.to_string())
                    ));

                    if attempt <= MAX_RETRIES {
                        warn!(
                            provider = provider_name,
                            attempt = attempt,
                            error = %e,
                            "Network error, will retry"
                        );
                        tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                        continue;
                    }

                    return Err(error);
                }
            }
        }
    }
}

/// Map 4xx status codes to `LlmError` variants
fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::Auth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::RateLimited(format!("{provider_name} rate limit exceeded: {status}"))
        }
        _ => LlmError::Transport(format!("{provider_name} returned client error: {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_construction() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_http_client_with_custom_timeout() {
        let custom_timeout = Duration::from_secs(60);
        let client = HttpClient::with_max_timeout(custom_timeout).unwrap();
        assert_eq!(client.max_timeout, custom_timeout);
    }

    #[test]
    fn test_map_401_and_403_to_auth() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let error = map_client_error(status, "test-provider");
            match error {
                LlmError::Auth(msg) => {
                    assert!(msg.contains("test-provider"));
                    assert!(msg.contains("authentication failed"));
                }
                other => panic!("expected Auth for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_map_429_to_rate_limited() {
        let error = map_client_error(StatusCode::TOO_MANY_REQUESTS, "test-provider");
        match error {
            LlmError::RateLimited(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("rate limit"));
            }
            other => panic!("expected RateLimited for 429, got {other:?}"),
        }
    }

    #[test]
    fn test_map_other_4xx_to_transport() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::NOT_FOUND,
            StatusCode::UNPROCESSABLE_ENTITY,
        ] {
            let error = map_client_error(status, "test-provider");
            match error {
                LlmError::Transport(msg) => {
                    assert!(msg.contains("client error"));
                }
                other => panic!("expected Transport for {status}, got {other:?}"),
            }
        }
    }
}
