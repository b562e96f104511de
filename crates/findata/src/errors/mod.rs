//! Error types and retry classification for the API clients.
//!
//! This module provides:
//! - [`ApiError`]: The main error enum for all client operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

pub(crate) use retry::backoff_delay;

use thiserror::Error;

/// Errors that can occur while talking to a market data API.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines whether the
/// request routine re-issues the request with backoff before giving up.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The required API key is absent or empty.
    /// Raised at client construction, before any network access.
    #[error("Missing API key for {provider}")]
    MissingApiKey {
        /// The provider whose credential is missing
        provider: &'static str,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: &'static str,
    },

    /// A connection-level transport failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider returned a non-2xx status not otherwise classified.
    #[error("HTTP {status} from {provider}")]
    Http {
        /// The provider that returned the status
        provider: &'static str,
        /// The HTTP status code
        status: u16,
    },

    /// The provider rate limited the request, either via HTTP status
    /// (429/403) or via a rate-limit-shaped message in a 200 body.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: &'static str,
    },

    /// Well-formed JSON carrying a vendor-defined error shape.
    #[error("Vendor error: {provider} - {message}")]
    Vendor {
        /// The provider that returned the error
        provider: &'static str,
        /// The error message from the provider
        message: String,
    },

    /// The response body was not JSON, or did not match the expected shape.
    #[error("Decode error: {provider} - {message}")]
    Decode {
        /// The provider whose response failed to decode
        provider: &'static str,
        /// Description of the decode failure
        message: String,
    },
}

impl ApiError {
    /// Returns the retry classification for this error.
    ///
    /// Transient failures (timeout, connection error, rate limit, 5xx)
    /// are [`RetryClass::WithBackoff`]; everything else is terminal.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout { .. } | Self::Network(_) | Self::RateLimited { .. } => {
                RetryClass::WithBackoff
            }
            Self::Http { status, .. } if *status >= 500 => RetryClass::WithBackoff,
            _ => RetryClass::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_never_retries() {
        let error = ApiError::MissingApiKey {
            provider: "ALPHA_VANTAGE",
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_timeout_retries_with_backoff() {
        let error = ApiError::Timeout {
            provider: "FINNHUB",
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = ApiError::RateLimited {
            provider: "ALPHA_VANTAGE",
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_server_error_retries_with_backoff() {
        let error = ApiError::Http {
            provider: "FINNHUB",
            status: 502,
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_client_error_never_retries() {
        let error = ApiError::Http {
            provider: "FINNHUB",
            status: 404,
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_vendor_error_never_retries() {
        let error = ApiError::Vendor {
            provider: "ALPHA_VANTAGE",
            message: "Invalid API call".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_decode_error_never_retries() {
        let error = ApiError::Decode {
            provider: "FINNHUB",
            message: "expected object".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_error_display() {
        let error = ApiError::MissingApiKey {
            provider: "ALPHA_VANTAGE",
        };
        assert_eq!(format!("{}", error), "Missing API key for ALPHA_VANTAGE");

        let error = ApiError::Vendor {
            provider: "FINNHUB",
            message: "rate limit".to_string(),
        };
        assert_eq!(format!("{}", error), "Vendor error: FINNHUB - rate limit");

        let error = ApiError::Http {
            provider: "FINNHUB",
            status: 503,
        };
        assert_eq!(format!("{}", error), "HTTP 503 from FINNHUB");
    }
}
