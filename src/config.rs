//! Remote service connection configuration.
//!
//! Constructed once at startup and handed to the HTTP client; nothing in
//! the core reads ambient environment state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default MobSF base address when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Errors raised while building the startup configuration.
///
/// These are fatal: the process never starts serving with a broken
/// configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The API key is missing or empty.
    #[error("MobSF API key is required (set MOBSF_API_KEY)")]
    MissingApiKey,
    /// The API key cannot be sent as an HTTP header value.
    #[error("MobSF API key contains characters not valid in an HTTP header")]
    InvalidApiKey,
    /// The base URL does not parse.
    #[error("invalid MobSF base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Connection settings for the remote scanning service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    base_url: String,
    api_key: String,
}

impl ServiceConfig {
    /// Creates a validated configuration.
    ///
    /// The base URL must parse; the API key must be non-empty. A trailing
    /// slash on the base URL is trimmed so path joining stays uniform.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let api_key = api_key.into();

        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        reqwest::Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Base address of the remote service, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access credential sent on every request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_fatal() {
        let err = ServiceConfig::new(DEFAULT_BASE_URL, "").unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let err = ServiceConfig::new(DEFAULT_BASE_URL, "   ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn invalid_base_url_is_fatal() {
        let err = ServiceConfig::new("not a url", "key").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ServiceConfig::new("http://127.0.0.1:8000/", "key").unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
    }
}
