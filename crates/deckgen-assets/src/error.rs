//! Error type shared by all asset providers
//!
//! Asset failures are never fatal to a deck. The enrichment engine catches
//! every variant, substitutes a placeholder, and records a warning.

use std::time::Duration;

/// Errors from asset providers and the enrichment engine
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Authentication failure: bad key, missing key, exhausted credits
    #[error("provider authentication failed: {0}")]
    Auth(String),

    /// Rate limited on every submit attempt
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Job did not finish within its budget
    #[error("asset job timed out after {budget:?}")]
    Timeout { budget: Duration },

    /// Provider reported a failure for this job
    #[error("provider error: {0}")]
    Provider(String),

    /// Network-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Search providers and icon lookup: nothing matched
    #[error("no matching asset found for '{0}'")]
    NotFound(String),

    /// Failed to write the downloaded asset to disk
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
