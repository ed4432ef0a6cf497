//! Process-wide static settings for Bio-Next.
//!
//! Read once from the environment at startup and passed explicitly to the
//! components that need them. There is no global config singleton.

use std::env;
use std::time::Duration;

// Defaults match the deployed front end configuration.
const DEFAULT_API_BASE_URL: &str = "https://sg.uiuiapi.com/v1";
const DEFAULT_MODEL: &str = "o3-mini-2025-01-31";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_FILE_SIZE: u64 = 104_857_600; // 100 MB
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_ENVIRONMENT: &str = "development";

/// Static configuration, read-only after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the OpenAI-compatible completion API.
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    /// Bound on every outbound completion request.
    pub request_timeout: Duration,
    /// Max accepted upload size in bytes.
    pub max_file_size: u64,
    /// Allowed upload extensions (with leading dot), or `["*"]` for any.
    pub allowed_extensions: Vec<String>,
    /// Target environment name ("development" / "production").
    pub environment: String,
    /// Listen address for the HTTP server.
    pub bind_addr: String,
}

impl Config {
    /// Build the configuration from `BIONEXT_*` environment variables,
    /// falling back to the defaults above.
    pub fn from_env() -> Self {
        Self {
            api_base_url: env_or("BIONEXT_API_BASE_URL", DEFAULT_API_BASE_URL),
            api_key: env::var("BIONEXT_API_KEY").unwrap_or_default(),
            model: env_or("BIONEXT_MODEL", DEFAULT_MODEL),
            request_timeout: Duration::from_secs(
                env_parsed("BIONEXT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            ),
            max_file_size: env_parsed("BIONEXT_MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE),
            allowed_extensions: env::var("BIONEXT_ALLOWED_FILE_TYPES")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| vec!["*".to_string()]),
            environment: env_or("BIONEXT_ENV", DEFAULT_ENVIRONMENT),
            bind_addr: env_or("BIONEXT_BIND", DEFAULT_BIND_ADDR),
        }
    }

    /// Check the configuration for problems. Returns human-readable
    /// descriptions; an empty list means the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.api_base_url.is_empty() {
            errors.push("API base URL is not configured".to_string());
        }
        if self.api_key.is_empty() {
            errors.push("API key is not configured (set BIONEXT_API_KEY)".to_string());
        }
        if self.max_file_size == 0 {
            errors.push("Max file size must be greater than zero".to_string());
        }
        if self.request_timeout.is_zero() {
            errors.push("Request timeout must be greater than zero".to_string());
        }

        errors
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: "sk-test".to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: vec!["*".to_string()],
            environment: "development".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(valid_config().validate().is_empty());
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let mut config = valid_config();
        config.api_key = String::new();

        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("API key"));
    }

    #[test]
    fn test_zero_limits_are_reported() {
        let mut config = valid_config();
        config.max_file_size = 0;
        config.request_timeout = Duration::ZERO;

        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn test_environment_helpers() {
        let mut config = valid_config();
        assert!(config.is_development());
        config.environment = "production".to_string();
        assert!(config.is_production());
    }
}
