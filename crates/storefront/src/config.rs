//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `JAVACAFE_API_BASE_URL` - Backend base URL (default: `http://localhost:8080`)
//! - `JAVACAFE_DATA_DIR` - Directory holding `cart.json` and `session.json` (default: `.javacafe`)
//! - `JAVACAFE_MEMBER_ORDER_PATH` - Member order endpoint (default: `/api/cart/member/submit`)
//! - `JAVACAFE_MENU_CACHE_TTL_SECS` - Menu/description cache lifetime (default: 300)
//! - `JAVACAFE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_DATA_DIR: &str = ".javacafe";
const DEFAULT_MEMBER_ORDER_PATH: &str = "/api/cart/member/submit";
const DEFAULT_MENU_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the cafe backend (scheme, host, port)
    pub api_base_url: Url,
    /// Directory for the persisted cart and session
    pub data_dir: PathBuf,
    /// Path of the member order endpoint (older backends use `/api/cart/new`)
    pub member_order_path: String,
    /// How long menu and description responses stay cached
    pub menu_cache_ttl: Duration,
    /// Optional per-request timeout; unset means requests may hang
    pub request_timeout: Option<Duration>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_base_url = parse_base_url(
            "JAVACAFE_API_BASE_URL",
            &get_or("JAVACAFE_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let data_dir = PathBuf::from(get_or("JAVACAFE_DATA_DIR", DEFAULT_DATA_DIR));

        let member_order_path = get_or("JAVACAFE_MEMBER_ORDER_PATH", DEFAULT_MEMBER_ORDER_PATH);
        if !member_order_path.starts_with('/') {
            return Err(ConfigError::InvalidEnvVar(
                "JAVACAFE_MEMBER_ORDER_PATH".to_string(),
                "must start with '/'".to_string(),
            ));
        }

        let menu_cache_ttl = Duration::from_secs(parse_secs(
            "JAVACAFE_MENU_CACHE_TTL_SECS",
            lookup("JAVACAFE_MENU_CACHE_TTL_SECS"),
        )?
        .unwrap_or(DEFAULT_MENU_CACHE_TTL_SECS));

        let request_timeout = parse_secs(
            "JAVACAFE_REQUEST_TIMEOUT_SECS",
            lookup("JAVACAFE_REQUEST_TIMEOUT_SECS"),
        )?
        .map(Duration::from_secs);

        Ok(Self {
            api_base_url,
            data_dir,
            member_order_path,
            menu_cache_ttl,
            request_timeout,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty()),
        })
    }

    /// Configuration pointing at `api_base_url` with every other setting at
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not an absolute http(s) URL.
    pub fn for_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        let base = api_base_url.to_string();
        Self::from_lookup(move |key| (key == "JAVACAFE_API_BASE_URL").then(|| base.clone()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and check the backend base URL.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute URL with a host".to_string(),
        ));
    }
    Ok(url)
}

/// Parse an optional whole number of seconds.
fn parse_secs(key: &str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.data_dir, PathBuf::from(".javacafe"));
        assert_eq!(config.member_order_path, "/api/cart/member/submit");
        assert_eq!(config.menu_cache_ttl, Duration::from_secs(300));
        assert!(config.request_timeout.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JAVACAFE_API_BASE_URL", "https://api.javacafe.test"),
            ("JAVACAFE_DATA_DIR", "/tmp/cafe"),
            ("JAVACAFE_MEMBER_ORDER_PATH", "/api/cart/new"),
            ("JAVACAFE_MENU_CACHE_TTL_SECS", "60"),
            ("JAVACAFE_REQUEST_TIMEOUT_SECS", "15"),
            ("SENTRY_DSN", ""),
        ])
        .unwrap();

        assert_eq!(config.api_base_url.host_str(), Some("api.javacafe.test"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cafe"));
        assert_eq!(config.member_order_path, "/api/cart/new");
        assert_eq!(config.menu_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        let err = load(&[("JAVACAFE_API_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "JAVACAFE_API_BASE_URL"));

        let err = load(&[("JAVACAFE_API_BASE_URL", "ftp://cafe.test")]).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_invalid_numbers_and_paths() {
        assert!(load(&[("JAVACAFE_REQUEST_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("JAVACAFE_MENU_CACHE_TTL_SECS", "-1")]).is_err());
        assert!(load(&[("JAVACAFE_MEMBER_ORDER_PATH", "api/cart/new")]).is_err());
    }

    #[test]
    fn test_for_base_url() {
        let config = StorefrontConfig::for_base_url("http://127.0.0.1:1234").unwrap();
        assert_eq!(config.api_base_url.port(), Some(1234));
        assert_eq!(config.member_order_path, DEFAULT_MEMBER_ORDER_PATH);
    }
}
