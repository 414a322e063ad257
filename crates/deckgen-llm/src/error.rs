//! Error type shared by all text-generation backends

use std::time::Duration;

/// Errors from text-generation backends
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response body)
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("provider authentication error: {0}")]
    Auth(String),

    /// Provider rate limit exceeded (429)
    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    /// Provider service outage (5xx after retries)
    #[error("provider outage: {0}")]
    Outage(String),

    /// Call timed out
    #[error("timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Invalid provider settings, including a missing API key variable
    #[error("misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unknown provider name
    #[error("unsupported: {0}")]
    Unsupported(String),
}
