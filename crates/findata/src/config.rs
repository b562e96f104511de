//! Environment-based configuration for the API clients.
//!
//! Settings are read once at startup (optionally from a local `.env` file)
//! and passed by reference into each client's constructor. A missing API key
//! is reported loudly here but only becomes an error when the corresponding
//! client is constructed.

use std::time::Duration;

use log::warn;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Runtime settings shared by both clients.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Alpha Vantage API key (`ALPHA_VANTAGE_API_KEY`)
    pub alpha_vantage_api_key: Option<String>,

    /// Finnhub API key (`FINNHUB_API_KEY`)
    pub finnhub_api_key: Option<String>,

    /// Per-request timeout (`REQUEST_TIMEOUT`, seconds)
    pub request_timeout: Duration,

    /// Maximum retries for transient failures (`MAX_RETRIES`)
    pub max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            finnhub_api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Missing keys and malformed numeric values are logged and fall back
    /// to defaults; enforcement of required credentials happens in the
    /// client constructors.
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            warn!("no .env file found, reading configuration from process environment only");
        }

        let alpha_vantage_api_key = read_key("ALPHA_VANTAGE_API_KEY");
        let finnhub_api_key = read_key("FINNHUB_API_KEY");

        let request_timeout = Duration::from_secs(read_number(
            "REQUEST_TIMEOUT",
            DEFAULT_TIMEOUT_SECS,
        ));
        let max_retries = read_number("MAX_RETRIES", DEFAULT_MAX_RETRIES);

        Self {
            alpha_vantage_api_key,
            finnhub_api_key,
            request_timeout,
            max_retries,
        }
    }

    /// Whether both API keys are present and non-empty.
    pub fn is_configured(&self) -> bool {
        has_value(&self.alpha_vantage_api_key) && has_value(&self.finnhub_api_key)
    }
}

fn has_value(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

fn read_key(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            warn!("{} is not set", name);
            None
        }
    }
}

fn read_number<T: std::str::FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("invalid {} value '{}', using default {}", name, value, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.alpha_vantage_api_key.is_none());
        assert!(settings.finnhub_api_key.is_none());
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn test_is_configured_requires_both_keys() {
        let mut settings = Settings::default();
        assert!(!settings.is_configured());

        settings.alpha_vantage_api_key = Some("demo".to_string());
        assert!(!settings.is_configured());

        settings.finnhub_api_key = Some("demo".to_string());
        assert!(settings.is_configured());
    }

    #[test]
    fn test_blank_key_does_not_count_as_configured() {
        let settings = Settings {
            alpha_vantage_api_key: Some("  ".to_string()),
            finnhub_api_key: Some("demo".to_string()),
            ..Settings::default()
        };
        assert!(!settings.is_configured());
    }
}
