//! Configuration for the OKX client

use std::env;
use std::time::Duration;

use common::error::{Error, Result};

/// Production REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.okx.com";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Credentials and transport settings for the OKX REST API
#[derive(Debug, Clone)]
pub struct OkxConfig {
    /// REST base URL, without trailing slash
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// API secret used to sign requests
    pub secret_key: String,
    /// API passphrase
    pub passphrase: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl OkxConfig {
    /// Create a new configuration with custom values
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase: passphrase.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create a new configuration using environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("OKX_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env::var("OKX_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self::new(
            base_url,
            required("OKX_API_KEY")?,
            required("OKX_SECRET_KEY")?,
            required("OKX_PASSPHRASE")?,
        )
        .with_timeout(Duration::from_secs(timeout_secs)))
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::ConfigurationError(format!("{} must be set", name)))
}
