//! Alpha Vantage API client.
//!
//! Alpha Vantage multiplexes dozens of logical endpoints through a single
//! physical endpoint, distinguished only by a `function` query parameter,
//! and signals rate-limiting and entitlement errors via HTTP 200 bodies
//! carrying an `Error Message`, `Note`, or `Information` key. Inspecting
//! the response content is therefore the only reliable error channel, and
//! every call screens the body before decoding.
//!
//! Free tier is limited to a handful of API calls per minute.

mod models;

pub use models::{
    AnnualEarnings, BalanceSheet, CashFlow, CompanyOverview, EarningsHistory, FundamentalReports,
    GlobalQuote, IncomeStatement, IntradayBar, MarketMovers, Mover, NewsArticle, NewsSentiment,
    QuarterlyEarnings, SeriesBar, SymbolMatch, TickerSentiment,
};

use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;

use crate::config::Settings;
use crate::errors::{backoff_delay, ApiError, RetryClass};

const BASE_URL: &str = "https://www.alphavantage.co/query";
pub(crate) const PROVIDER_ID: &str = "ALPHA_VANTAGE";

pub(crate) fn vendor_err(message: impl Into<String>) -> ApiError {
    ApiError::Vendor {
        provider: PROVIDER_ID,
        message: message.into(),
    }
}

pub(crate) fn decode_err(message: impl Into<String>) -> ApiError {
    ApiError::Decode {
        provider: PROVIDER_ID,
        message: message.into(),
    }
}

/// Intraday bar interval.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Interval {
    Min1,
    #[default]
    Min5,
    Min15,
    Min30,
    Min60,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Min1 => "1min",
            Self::Min5 => "5min",
            Self::Min15 => "15min",
            Self::Min30 => "30min",
            Self::Min60 => "60min",
        }
    }
}

/// Series length: ~100 most recent points, or the full history.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputSize {
    #[default]
    Compact,
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

/// Sort order for news sentiment queries.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NewsSort {
    #[default]
    Latest,
    Earliest,
    Relevance,
}

impl NewsSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "LATEST",
            Self::Earliest => "EARLIEST",
            Self::Relevance => "RELEVANCE",
        }
    }
}

/// Options for intraday series requests.
#[derive(Clone, Debug)]
pub struct IntradayQuery {
    pub interval: Interval,
    /// Adjust for splits and dividends
    pub adjusted: bool,
    /// Include pre- and post-market bars
    pub extended_hours: bool,
    /// Restrict to one month of history, `YYYY-MM`
    pub month: Option<String>,
    pub output_size: OutputSize,
}

impl Default for IntradayQuery {
    fn default() -> Self {
        Self {
            interval: Interval::default(),
            adjusted: true,
            extended_hours: true,
            month: None,
            output_size: OutputSize::default(),
        }
    }
}

/// Filters for news sentiment requests.
#[derive(Clone, Debug)]
pub struct NewsQuery {
    /// Comma-separated tickers, e.g. `"AAPL,TSLA"`
    pub tickers: Option<String>,
    /// Comma-separated topics, e.g. `"technology,ipo"`
    pub topics: Option<String>,
    /// Earliest publication time, `YYYYMMDDTHHMM`
    pub time_from: Option<String>,
    /// Latest publication time, `YYYYMMDDTHHMM`
    pub time_to: Option<String>,
    pub sort: NewsSort,
    /// Maximum articles to return (vendor cap: 1000)
    pub limit: u32,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            tickers: None,
            topics: None,
            time_from: None,
            time_to: None,
            sort: NewsSort::default(),
            limit: 50,
        }
    }
}

/// Alpha Vantage API client.
///
/// Holds an immutable API key and a reusable connection pool; one instance
/// serves arbitrarily many sequential requests.
#[derive(Debug)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    max_retries: u32,
}

impl AlphaVantageClient {
    /// Create a client with the given API key and default timeout/retries.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingApiKey`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_config(api_key, &Settings::default())
    }

    /// Create a client from [`Settings`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingApiKey`] if `alpha_vantage_api_key`
    /// is absent or empty.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let api_key = settings
            .alpha_vantage_api_key
            .clone()
            .ok_or(ApiError::MissingApiKey {
                provider: PROVIDER_ID,
            })?;
        Self::with_config(api_key, settings)
    }

    fn with_config(api_key: impl Into<String>, settings: &Settings) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ApiError::MissingApiKey {
                provider: PROVIDER_ID,
            });
        }

        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            api_key,
            max_retries: settings.max_retries,
        })
    }

    /// Issue one GET against the query endpoint and screen the body for
    /// vendor error shapes. The API key is appended here and never logged.
    async fn request(&self, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let function = params
            .first()
            .map(|(_, v)| v.as_str())
            .unwrap_or("UNKNOWN");
        debug!("Alpha Vantage request: function={}", function);

        let response = self
            .client
            .get(BASE_URL)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout {
                        provider: PROVIDER_ID,
                    }
                } else {
                    ApiError::Network(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited {
                provider: PROVIDER_ID,
            });
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                provider: PROVIDER_ID,
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(ApiError::Network)?;

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| decode_err(format!("response is not JSON: {}", e)))?;

        check_vendor_error(&value)?;
        Ok(value)
    }

    /// Request with bounded retry on transient failures.
    async fn request_with_retry(&self, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let mut attempt = 0;
        loop {
            match self.request(params).await {
                Ok(value) => return Ok(value),
                Err(err)
                    if attempt < self.max_retries
                        && err.retry_class() == RetryClass::WithBackoff =>
                {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "Alpha Vantage request failed ({}), retrying in {:?}",
                        err, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Intraday time series.
    pub async fn intraday(
        &self,
        symbol: &str,
        query: &IntradayQuery,
    ) -> Result<Vec<IntradayBar>, ApiError> {
        let mut params = vec![
            ("function", "TIME_SERIES_INTRADAY".to_string()),
            ("symbol", symbol.to_string()),
            ("interval", query.interval.as_str().to_string()),
            ("adjusted", query.adjusted.to_string()),
            ("extended_hours", query.extended_hours.to_string()),
            ("outputsize", query.output_size.as_str().to_string()),
        ];
        if let Some(ref month) = query.month {
            params.push(("month", month.clone()));
        }

        let value = self.request_with_retry(&params).await?;
        let bars = models::parse_intraday(&value)?;
        debug!(
            "Alpha Vantage: fetched {} intraday bars for {}",
            bars.len(),
            symbol
        );
        Ok(bars)
    }

    /// Daily time series.
    pub async fn daily(
        &self,
        symbol: &str,
        adjusted: bool,
        output_size: OutputSize,
    ) -> Result<Vec<SeriesBar>, ApiError> {
        let function = if adjusted {
            "TIME_SERIES_DAILY_ADJUSTED"
        } else {
            "TIME_SERIES_DAILY"
        };
        let params = vec![
            ("function", function.to_string()),
            ("symbol", symbol.to_string()),
            ("outputsize", output_size.as_str().to_string()),
        ];

        let value = self.request_with_retry(&params).await?;
        let bars = models::parse_series(&value)?;
        debug!(
            "Alpha Vantage: fetched {} daily bars for {}",
            bars.len(),
            symbol
        );
        Ok(bars)
    }

    /// Weekly time series.
    pub async fn weekly(&self, symbol: &str, adjusted: bool) -> Result<Vec<SeriesBar>, ApiError> {
        let function = if adjusted {
            "TIME_SERIES_WEEKLY_ADJUSTED"
        } else {
            "TIME_SERIES_WEEKLY"
        };
        let params = vec![
            ("function", function.to_string()),
            ("symbol", symbol.to_string()),
        ];

        let value = self.request_with_retry(&params).await?;
        models::parse_series(&value)
    }

    /// Monthly time series.
    pub async fn monthly(&self, symbol: &str, adjusted: bool) -> Result<Vec<SeriesBar>, ApiError> {
        let function = if adjusted {
            "TIME_SERIES_MONTHLY_ADJUSTED"
        } else {
            "TIME_SERIES_MONTHLY"
        };
        let params = vec![
            ("function", function.to_string()),
            ("symbol", symbol.to_string()),
        ];

        let value = self.request_with_retry(&params).await?;
        models::parse_series(&value)
    }

    /// Real-time quote.
    pub async fn quote(&self, symbol: &str) -> Result<GlobalQuote, ApiError> {
        let params = vec![
            ("function", "GLOBAL_QUOTE".to_string()),
            ("symbol", symbol.to_string()),
        ];

        let value = self.request_with_retry(&params).await?;
        models::parse_global_quote(&value)
    }

    /// Search for symbols by keywords.
    pub async fn search(&self, keywords: &str) -> Result<Vec<SymbolMatch>, ApiError> {
        let params = vec![
            ("function", "SYMBOL_SEARCH".to_string()),
            ("keywords", keywords.to_string()),
        ];

        let value = self.request_with_retry(&params).await?;
        models::parse_symbol_search(&value)
    }

    /// Company fundamentals overview.
    pub async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, ApiError> {
        let params = vec![
            ("function", "OVERVIEW".to_string()),
            ("symbol", symbol.to_string()),
        ];

        let value = self.request_with_retry(&params).await?;
        let overview: CompanyOverview = serde_json::from_value(value)
            .map_err(|e| decode_err(format!("malformed company overview: {}", e)))?;

        // The vendor answers unknown symbols with an empty object
        if overview.symbol.is_none() {
            return Err(vendor_err(format!("no overview data for {}", symbol)));
        }

        Ok(overview)
    }

    /// Annual and quarterly income statements.
    pub async fn income_statement(
        &self,
        symbol: &str,
    ) -> Result<FundamentalReports<IncomeStatement>, ApiError> {
        self.fundamentals(symbol, "INCOME_STATEMENT").await
    }

    /// Annual and quarterly balance sheets.
    pub async fn balance_sheet(
        &self,
        symbol: &str,
    ) -> Result<FundamentalReports<BalanceSheet>, ApiError> {
        self.fundamentals(symbol, "BALANCE_SHEET").await
    }

    /// Annual and quarterly cash flow statements.
    pub async fn cash_flow(&self, symbol: &str) -> Result<FundamentalReports<CashFlow>, ApiError> {
        self.fundamentals(symbol, "CASH_FLOW").await
    }

    async fn fundamentals<T: serde::de::DeserializeOwned>(
        &self,
        symbol: &str,
        function: &str,
    ) -> Result<FundamentalReports<T>, ApiError> {
        let params = vec![
            ("function", function.to_string()),
            ("symbol", symbol.to_string()),
        ];

        let value = self.request_with_retry(&params).await?;
        serde_json::from_value(value)
            .map_err(|e| decode_err(format!("malformed {} response: {}", function, e)))
    }

    /// Annual EPS history and quarterly earnings surprises.
    pub async fn earnings(&self, symbol: &str) -> Result<EarningsHistory, ApiError> {
        let params = vec![
            ("function", "EARNINGS".to_string()),
            ("symbol", symbol.to_string()),
        ];

        let value = self.request_with_retry(&params).await?;
        serde_json::from_value(value)
            .map_err(|e| decode_err(format!("malformed earnings response: {}", e)))
    }

    /// Top gainers, losers, and most actively traded US tickers.
    pub async fn market_movers(&self) -> Result<MarketMovers, ApiError> {
        let params = vec![("function", "TOP_GAINERS_LOSERS".to_string())];

        let value = self.request_with_retry(&params).await?;
        serde_json::from_value(value)
            .map_err(|e| decode_err(format!("malformed movers response: {}", e)))
    }

    /// Market news with sentiment scores.
    pub async fn news_sentiment(&self, query: &NewsQuery) -> Result<NewsSentiment, ApiError> {
        let mut params = vec![
            ("function", "NEWS_SENTIMENT".to_string()),
            ("sort", query.sort.as_str().to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(ref tickers) = query.tickers {
            params.push(("tickers", tickers.clone()));
        }
        if let Some(ref topics) = query.topics {
            params.push(("topics", topics.clone()));
        }
        if let Some(ref time_from) = query.time_from {
            params.push(("time_from", time_from.clone()));
        }
        if let Some(ref time_to) = query.time_to {
            params.push(("time_to", time_to.clone()));
        }

        let value = self.request_with_retry(&params).await?;
        serde_json::from_value(value)
            .map_err(|e| decode_err(format!("malformed news response: {}", e)))
    }
}

/// Screen a 200 body for the vendor's error shapes.
///
/// Presence of any of the three keys classifies the call as failed
/// regardless of HTTP status. `Note`/`Information` messages that mention
/// call frequency, rate limits, or premium entitlement are retryable
/// rate-limit failures; everything else is terminal.
fn check_vendor_error(value: &Value) -> Result<(), ApiError> {
    let Some(obj) = value.as_object() else {
        return Ok(());
    };

    if let Some(message) = obj.get("Error Message").and_then(Value::as_str) {
        return Err(vendor_err(message));
    }

    for key in ["Note", "Information"] {
        if let Some(message) = obj.get(key).and_then(Value::as_str) {
            if is_rate_limit_message(message) {
                warn!("Alpha Vantage rate limit: {}", message);
                return Err(ApiError::RateLimited {
                    provider: PROVIDER_ID,
                });
            }
            return Err(vendor_err(message));
        }
    }

    Ok(())
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("call frequency")
        || lower.contains("rate limit")
        || lower.contains("premium")
        || lower.contains("requests per day")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_key() {
        let err = AlphaVantageClient::new("").unwrap_err();
        assert!(matches!(
            err,
            ApiError::MissingApiKey {
                provider: "ALPHA_VANTAGE"
            }
        ));

        let err = AlphaVantageClient::new("   ").unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey { .. }));
    }

    #[test]
    fn test_from_settings_without_key() {
        let err = AlphaVantageClient::from_settings(&Settings::default()).unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey { .. }));
    }

    #[test]
    fn test_from_settings_with_key() {
        let settings = Settings {
            alpha_vantage_api_key: Some("demo".to_string()),
            ..Settings::default()
        };
        assert!(AlphaVantageClient::from_settings(&settings).is_ok());
    }

    #[test]
    fn test_check_vendor_error_message() {
        let body: Value = serde_json::from_str(
            r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#,
        )
        .unwrap();

        let err = check_vendor_error(&body).unwrap_err();
        assert!(matches!(err, ApiError::Vendor { .. }));
    }

    #[test]
    fn test_check_vendor_error_note_rate_limit() {
        let body: Value = serde_json::from_str(
            r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#,
        )
        .unwrap();

        let err = check_vendor_error(&body).unwrap_err();
        assert!(matches!(err, ApiError::RateLimited { .. }));
        assert_eq!(err.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_check_vendor_error_information_entitlement() {
        let body: Value = serde_json::from_str(
            r#"{"Information": "This is a premium endpoint. Subscribe to any of the premium plans."}"#,
        )
        .unwrap();

        let err = check_vendor_error(&body).unwrap_err();
        assert!(matches!(err, ApiError::RateLimited { .. }));
    }

    #[test]
    fn test_check_vendor_error_generic_information() {
        let body: Value =
            serde_json::from_str(r#"{"Information": "No data available for this symbol."}"#)
                .unwrap();

        let err = check_vendor_error(&body).unwrap_err();
        assert!(matches!(err, ApiError::Vendor { .. }));
        assert_eq!(err.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_check_vendor_error_clean_body() {
        let body: Value =
            serde_json::from_str(r#"{"Global Quote": {"05. price": "123.45"}}"#).unwrap();
        assert!(check_vendor_error(&body).is_ok());
    }

    #[test]
    fn test_interval_wire_values() {
        assert_eq!(Interval::Min1.as_str(), "1min");
        assert_eq!(Interval::Min5.as_str(), "5min");
        assert_eq!(Interval::Min60.as_str(), "60min");
    }

    #[test]
    fn test_output_size_wire_values() {
        assert_eq!(OutputSize::Compact.as_str(), "compact");
        assert_eq!(OutputSize::Full.as_str(), "full");
    }

    #[test]
    fn test_news_sort_wire_values() {
        assert_eq!(NewsSort::Latest.as_str(), "LATEST");
        assert_eq!(NewsSort::Earliest.as_str(), "EARLIEST");
        assert_eq!(NewsSort::Relevance.as_str(), "RELEVANCE");
    }

    #[test]
    fn test_intraday_query_defaults() {
        let query = IntradayQuery::default();
        assert_eq!(query.interval, Interval::Min5);
        assert!(query.adjusted);
        assert!(query.extended_hours);
        assert!(query.month.is_none());
        assert_eq!(query.output_size, OutputSize::Compact);
    }

    #[test]
    fn test_news_query_defaults() {
        let query = NewsQuery::default();
        assert_eq!(query.sort, NewsSort::Latest);
        assert_eq!(query.limit, 50);
        assert!(query.tickers.is_none());
    }
}
