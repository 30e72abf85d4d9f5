//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WARDROBE_API_URL` - Base URL of the storefront REST API
//!
//! ## Optional
//! - `WARDROBE_API_TOKEN` - Bearer token sent with API requests
//! - `WARDROBE_DATA_DIR` - Directory for persisted cart storage (default: .wardrobe)
//! - `WARDROBE_CART_KEY` - Storage key of the cart snapshot (default: cart).
//!   Letters, digits, `.`, `_` and `-` only, not starting with `.`
//! - `WARDROBE_HTTP_TIMEOUT_SECS` - API request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::cart::DEFAULT_CART_KEY;
use crate::cart::storage::validate_key;

const DEFAULT_DATA_DIR: &str = ".wardrobe";
const DEFAULT_TIMEOUT_SECS: &str = "15";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// REST API connection settings
    pub api: ApiConfig,
    /// Directory holding persisted storage slots
    pub data_dir: PathBuf,
    /// Storage key of the cart snapshot
    pub cart_key: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// REST API connection settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; always ends with `/` so endpoint paths join beneath it
    pub base_url: Url,
    /// Bearer token for authenticated requests
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StorefrontConfig {
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let api = ApiConfig {
            base_url: parse_base_url(&env.required("WARDROBE_API_URL")?)?,
            token: env
                .optional("WARDROBE_API_TOKEN")
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
            timeout: Duration::from_secs(
                env.or_default("WARDROBE_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
                    .parse::<u64>()
                    .map_err(|e| {
                        ConfigError::InvalidEnvVar(
                            "WARDROBE_HTTP_TIMEOUT_SECS".to_string(),
                            e.to_string(),
                        )
                    })?,
            ),
        };

        // File storage would refuse every read and write under a bad key
        let cart_key = env.or_default("WARDROBE_CART_KEY", DEFAULT_CART_KEY);
        validate_key(&cart_key).map_err(|e| {
            ConfigError::InvalidEnvVar("WARDROBE_CART_KEY".to_string(), e.to_string())
        })?;

        Ok(Self {
            api,
            data_dir: PathBuf::from(env.or_default("WARDROBE_DATA_DIR", DEFAULT_DATA_DIR)),
            cart_key,
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse the API base URL, forcing a trailing slash.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("WARDROBE_API_URL".to_string(), msg);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

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
        let config = load(&[("WARDROBE_API_URL", "http://localhost:5000/api")]).unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://localhost:5000/api/");
        assert!(config.api.token.is_none());
        assert_eq!(config.api.timeout, Duration::from_secs(15));
        assert_eq!(config.data_dir, PathBuf::from(".wardrobe"));
        assert_eq!(config.cart_key, "cart");
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "WARDROBE_API_URL"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("WARDROBE_API_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[("WARDROBE_API_URL", "ftp://files.example.com")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[
                ("WARDROBE_API_URL", "https://api.example.com"),
                ("WARDROBE_HTTP_TIMEOUT_SECS", "soon"),
            ]),
            Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "WARDROBE_HTTP_TIMEOUT_SECS"
        ));
        assert!(matches!(
            load(&[
                ("WARDROBE_API_URL", "https://api.example.com"),
                ("WARDROBE_CART_KEY", " "),
            ]),
            Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "WARDROBE_CART_KEY"
        ));
    }

    #[test]
    fn test_cart_key_must_be_a_storable_name() {
        for key in ["my cart", "../cart", ".cart", "cart/guest"] {
            let result = load(&[
                ("WARDROBE_API_URL", "https://api.example.com"),
                ("WARDROBE_CART_KEY", key),
            ]);
            assert!(
                matches!(result, Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "WARDROBE_CART_KEY"),
                "key: {key:?}"
            );
        }

        let config = load(&[
            ("WARDROBE_API_URL", "https://api.example.com"),
            ("WARDROBE_CART_KEY", "guest_cart.v2"),
        ])
        .unwrap();
        assert_eq!(config.cart_key, "guest_cart.v2");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WARDROBE_API_URL", "https://api.example.com/v1/"),
            ("WARDROBE_API_TOKEN", "tok_9f8e7d"),
            ("WARDROBE_DATA_DIR", "/var/lib/wardrobe"),
            ("WARDROBE_CART_KEY", "guest-cart"),
            ("WARDROBE_HTTP_TIMEOUT_SECS", "3"),
            ("SENTRY_DSN", "https://key@sentry.example.com/1"),
        ])
        .unwrap();
        assert_eq!(config.api.base_url.as_str(), "https://api.example.com/v1/");
        assert_eq!(config.api.token.unwrap().expose_secret(), "tok_9f8e7d");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/wardrobe"));
        assert_eq!(config.cart_key, "guest-cart");
        assert_eq!(config.api.timeout, Duration::from_secs(3));
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = load(&[
            ("WARDROBE_API_URL", "https://api.example.com"),
            ("WARDROBE_API_TOKEN", "   "),
        ])
        .unwrap();
        assert!(config.api.token.is_none());
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let config = load(&[
            ("WARDROBE_API_URL", "https://api.example.com"),
            ("WARDROBE_API_TOKEN", "super_secret_bearer_token"),
        ])
        .unwrap();

        let debug_output = format!("{:?}", config.api);
        assert!(debug_output.contains("https://api.example.com/"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_bearer_token"));
    }
}
