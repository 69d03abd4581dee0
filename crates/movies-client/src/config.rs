//! Movies API client configuration.
//!
//! Points at a running `movies-api`. Override via environment variables or
//! explicit construction for tests.

use url::Url;

/// Configuration for connecting to the movies API.
///
/// Custom `Debug` implementation redacts the `token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Service root, e.g. `http://localhost:8080`.
    pub base_url: Url,
    /// Bearer token sent on every request. `None` calls anonymously.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Anonymous configuration with the default timeout.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout_secs: 30,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `MOVIES_API_URL` (default: `http://localhost:8080`)
    /// - `MOVIES_API_TOKEN` (optional)
    /// - `MOVIES_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("MOVIES_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("MOVIES_API_URL".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            token: std::env::var("MOVIES_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            timeout_secs: std::env::var("MOVIES_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("bearer token contains characters not allowed in a header")]
    InvalidToken,
}
