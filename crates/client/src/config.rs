//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPKIT_API_BASE_URL` - Base URL of the storefront REST backend
//!
//! ## Optional
//! - `SHOPKIT_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SHOPKIT_STALENESS_THRESHOLD_SECS` - Cache staleness threshold (default: 600)
//! - `SHOPKIT_BEARER_TOKEN` - Pre-seeded bearer token (mostly for tooling)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STALENESS_THRESHOLD_SECS: u64 = 600;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront REST backend.
    pub base_url: Url,
    /// Explicit per-request timeout. The backend has no server-side request
    /// deadline, so relying on the transport default would hang the UI.
    pub request_timeout: Duration,
    /// Maximum age of a cache entry before it is considered stale.
    pub staleness_threshold: Duration,
    /// Bearer token to seed the token store with, if configured.
    pub bearer_token: Option<SecretString>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("staleness_threshold", &self.staleness_threshold)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the base URL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            staleness_threshold: Duration::from_secs(DEFAULT_STALENESS_THRESHOLD_SECS),
            bearer_token: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_url(
            "SHOPKIT_API_BASE_URL",
            &get_required_env("SHOPKIT_API_BASE_URL")?,
        )?;
        let request_timeout = parse_secs(
            "SHOPKIT_REQUEST_TIMEOUT_SECS",
            &get_env_or_default(
                "SHOPKIT_REQUEST_TIMEOUT_SECS",
                &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
            ),
        )?;
        let staleness_threshold = parse_secs(
            "SHOPKIT_STALENESS_THRESHOLD_SECS",
            &get_env_or_default(
                "SHOPKIT_STALENESS_THRESHOLD_SECS",
                &DEFAULT_STALENESS_THRESHOLD_SECS.to_string(),
            ),
        )?;
        let bearer_token = get_optional_env("SHOPKIT_BEARER_TOKEN").map(SecretString::from);

        Ok(Self {
            base_url,
            request_timeout,
            staleness_threshold,
            bearer_token,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a URL-valued variable.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a seconds-valued variable into a `Duration`.
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = value
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secs_valid() {
        assert_eq!(parse_secs("T", "30").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_secs_rejects_zero() {
        let err = parse_secs("T", "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_secs_rejects_garbage() {
        assert!(parse_secs("T", "soon").is_err());
    }

    #[test]
    fn test_parse_url() {
        let url = parse_url("U", "https://api.example.com/v1").unwrap();
        assert_eq!(url.host_str(), Some("api.example.com"));
        assert!(parse_url("U", "not a url").is_err());
    }

    #[test]
    fn test_new_defaults() {
        let config = ClientConfig::new(Url::parse("https://api.example.com").unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.staleness_threshold, Duration::from_secs(600));
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = ClientConfig::new(Url::parse("https://api.example.com").unwrap());
        config.bearer_token = Some(SecretString::from("super-secret-token"));

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-token"));
    }
}
