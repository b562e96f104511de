//! Typed clients for the Alpha Vantage and Finnhub market data APIs.
//!
//! Both clients follow the same shape: one method per logical operation,
//! each building a query for a single GET request and decoding the JSON
//! response into an explicit per-endpoint record. Failures are returned as
//! [`ApiError`] values carrying the cause (missing credential, transport,
//! vendor rejection, rate limit, decode), never as a bare "no result".
//!
//! The two clients are independent; they share only the error type and the
//! [`Settings`] value that supplies API keys, the request timeout, and the
//! retry limit. Transient failures (timeouts, connection errors, HTTP 5xx,
//! rate limits) are retried with exponential backoff up to
//! [`Settings::max_retries`] times.
//!
//! # Example
//!
//! ```no_run
//! use findata::{AlphaVantageClient, FinnhubClient, Settings};
//!
//! # async fn run() -> Result<(), findata::ApiError> {
//! let settings = Settings::from_env();
//!
//! let alpha = AlphaVantageClient::from_settings(&settings)?;
//! let quote = alpha.quote("AAPL").await?;
//! println!("{} last traded at {}", quote.symbol, quote.price);
//!
//! let finnhub = FinnhubClient::from_settings(&settings)?;
//! let profile = finnhub.company_profile("AAPL").await?;
//! println!("{:?}", profile.name);
//! # Ok(())
//! # }
//! ```
//!
//! Neither client throttles or deduplicates requests; callers pace their
//! own calls against the vendors' rate limits.

pub mod alpha_vantage;
pub mod config;
pub mod errors;
pub mod finnhub;

pub use alpha_vantage::AlphaVantageClient;
pub use config::Settings;
pub use errors::{ApiError, RetryClass};
pub use finnhub::FinnhubClient;
