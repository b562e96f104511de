//! Finnhub API client.
//!
//! Finnhub spreads its capabilities across path-based endpoints under one
//! base URL and authenticates with an `X-Finnhub-Token` header. Errors on
//! 2xx responses are signaled by an object body carrying a non-empty
//! `error` field; several endpoints (news, candles, recommendations)
//! answer with JSON arrays instead of objects.
//!
//! Free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

mod models;

pub use models::{
    BasicFinancials, Candle, CompanyProfile, EarningsSurprise, FinancialFiling, FinancialLine,
    FinancialStatements, FinancialsReported, InsiderTransaction, InsiderTransactions, NewsArticle,
    PriceTarget, Quote, RecommendationTrend, SearchItem, SymbolInfo,
};

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::errors::{backoff_delay, ApiError, RetryClass};

use models::{CandleResponse, SearchResponse};

const BASE_URL: &str = "https://finnhub.io/api/v1";
pub(crate) const PROVIDER_ID: &str = "FINNHUB";

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

/// Candle resolution.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Resolution {
    Min1,
    Min5,
    Min15,
    Min30,
    Min60,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Min1 => "1",
            Self::Min5 => "5",
            Self::Min15 => "15",
            Self::Min30 => "30",
            Self::Min60 => "60",
            Self::Daily => "D",
            Self::Weekly => "W",
            Self::Monthly => "M",
        }
    }
}

/// Market news category.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NewsCategory {
    #[default]
    General,
    Forex,
    Crypto,
    Merger,
}

impl NewsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Forex => "forex",
            Self::Crypto => "crypto",
            Self::Merger => "merger",
        }
    }
}

/// Finnhub API client.
///
/// Holds an immutable API key and a reusable connection pool; one instance
/// serves arbitrarily many sequential requests. The key travels in the
/// `X-Finnhub-Token` header, never in the query string.
#[derive(Debug)]
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    max_retries: u32,
}

impl FinnhubClient {
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
    /// Returns [`ApiError::MissingApiKey`] if `finnhub_api_key` is absent
    /// or empty.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let api_key = settings
            .finnhub_api_key
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

    /// Issue one GET against `{base}/{endpoint}` and screen the body.
    async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        debug!("Finnhub request: {} with {} params", endpoint, params.len());

        let response = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(params)
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

        // API key quota exceeded
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::RateLimited {
                provider: PROVIDER_ID,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(vendor_err("invalid or missing API key"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // Surface the vendor's message when the body carries one
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                if let Some(message) = vendor_error_message(&value) {
                    return Err(vendor_err(message));
                }
            }

            return Err(ApiError::Http {
                provider: PROVIDER_ID,
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(ApiError::Network)?;

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| decode_err(format!("response is not JSON: {}", e)))?;

        if let Some(message) = vendor_error_message(&value) {
            return Err(vendor_err(message));
        }

        Ok(value)
    }

    /// Fetch with bounded retry on transient failures.
    async fn fetch_with_retry(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let mut attempt = 0;
        loop {
            match self.fetch(endpoint, params).await {
                Ok(value) => return Ok(value),
                Err(err)
                    if attempt < self.max_retries
                        && err.retry_class() == RetryClass::WithBackoff =>
                {
                    let delay = backoff_delay(attempt);
                    warn!("Finnhub request failed ({}), retrying in {:?}", err, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let value = self.fetch_with_retry(endpoint, params).await?;
        serde_json::from_value(value)
            .map_err(|e| decode_err(format!("malformed {} response: {}", endpoint, e)))
    }

    /// Real-time quote.
    pub async fn quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        let params = [("symbol", symbol.to_string())];
        let quote: Quote = self.request("/quote", &params).await?;

        if !quote.has_data() {
            return Err(vendor_err(format!(
                "symbol not found or no trading data: {}",
                symbol
            )));
        }

        Ok(quote)
    }

    /// Company profile and basic information.
    pub async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, ApiError> {
        let params = [("symbol", symbol.to_string())];
        let profile: CompanyProfile = self.request("/stock/profile2", &params).await?;

        if !profile.has_data() {
            return Err(vendor_err(format!("no profile data for {}", symbol)));
        }

        Ok(profile)
    }

    /// Historical candles, ascending by time.
    pub async fn candles(
        &self,
        symbol: &str,
        resolution: Resolution,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>, ApiError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("resolution", resolution.as_str().to_string()),
            ("from", from.timestamp().to_string()),
            ("to", to.timestamp().to_string()),
        ];

        let response: CandleResponse = self.request("/stock/candle", &params).await?;
        let candles = response.into_candles()?;

        debug!(
            "Finnhub: fetched {} candles for {} ({} to {})",
            candles.len(),
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        Ok(candles)
    }

    /// Latest market news for a category.
    pub async fn market_news(
        &self,
        category: NewsCategory,
        min_id: u64,
    ) -> Result<Vec<NewsArticle>, ApiError> {
        let params = [
            ("category", category.as_str().to_string()),
            ("minId", min_id.to_string()),
        ];
        self.request("/news", &params).await
    }

    /// Company news within a date range.
    pub async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsArticle>, ApiError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ];
        self.request("/company-news", &params).await
    }

    /// Analyst recommendation trends, one entry per month.
    pub async fn recommendation_trends(
        &self,
        symbol: &str,
    ) -> Result<Vec<RecommendationTrend>, ApiError> {
        let params = [("symbol", symbol.to_string())];
        self.request("/stock/recommendation", &params).await
    }

    /// Analyst price targets.
    pub async fn price_target(&self, symbol: &str) -> Result<PriceTarget, ApiError> {
        let params = [("symbol", symbol.to_string())];
        self.request("/stock/price-target", &params).await
    }

    /// Quarterly earnings surprises.
    pub async fn earnings(&self, symbol: &str) -> Result<Vec<EarningsSurprise>, ApiError> {
        let params = [("symbol", symbol.to_string())];
        self.request("/stock/earnings", &params).await
    }

    /// As-reported financial statements from SEC filings.
    pub async fn financials_reported(&self, symbol: &str) -> Result<FinancialsReported, ApiError> {
        let params = [("symbol", symbol.to_string())];
        self.request("/stock/financials-reported", &params).await
    }

    /// Basic financial metrics. `metric` is usually `"all"`.
    pub async fn basic_financials(
        &self,
        symbol: &str,
        metric: &str,
    ) -> Result<BasicFinancials, ApiError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("metric", metric.to_string()),
        ];
        self.request("/stock/metric", &params).await
    }

    /// Insider transactions, optionally bounded by filing date.
    pub async fn insider_transactions(
        &self,
        symbol: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<InsiderTransactions, ApiError> {
        let mut params = vec![("symbol", symbol.to_string())];
        if let Some(from) = from {
            params.push(("from", from.to_string()));
        }
        if let Some(to) = to {
            params.push(("to", to.to_string()));
        }
        self.request("/stock/insider-transactions", &params).await
    }

    /// All symbols listed on an exchange (e.g. `"US"`).
    pub async fn stock_symbols(&self, exchange: &str) -> Result<Vec<SymbolInfo>, ApiError> {
        let params = [("exchange", exchange.to_string())];
        self.request("/stock/symbol", &params).await
    }

    /// Search for symbols.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchItem>, ApiError> {
        let params = [("q", query.to_string())];
        let response: SearchResponse = self.request("/search", &params).await?;

        debug!(
            "Finnhub: found {} search results for '{}'",
            response.result.len(),
            query
        );

        Ok(response.result)
    }
}

/// Extract the vendor's error message from an object body carrying a
/// non-empty `error` field. Array bodies never carry one.
fn vendor_error_message(value: &Value) -> Option<String> {
    let message = value.as_object()?.get("error")?.as_str()?;
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_key() {
        let err = FinnhubClient::new("").unwrap_err();
        assert!(matches!(
            err,
            ApiError::MissingApiKey {
                provider: "FINNHUB"
            }
        ));
    }

    #[test]
    fn test_from_settings_without_key() {
        let err = FinnhubClient::from_settings(&Settings::default()).unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey { .. }));
    }

    #[test]
    fn test_from_settings_with_key() {
        let settings = Settings {
            finnhub_api_key: Some("demo".to_string()),
            ..Settings::default()
        };
        assert!(FinnhubClient::from_settings(&settings).is_ok());
    }

    #[test]
    fn test_vendor_error_message_present() {
        let body: Value =
            serde_json::from_str(r#"{"error": "API limit reached. Please try again later."}"#)
                .unwrap();
        assert_eq!(
            vendor_error_message(&body).as_deref(),
            Some("API limit reached. Please try again later.")
        );
    }

    #[test]
    fn test_vendor_error_message_empty_string_ignored() {
        let body: Value = serde_json::from_str(r#"{"error": ""}"#).unwrap();
        assert!(vendor_error_message(&body).is_none());
    }

    #[test]
    fn test_vendor_error_message_absent_on_clean_object() {
        let body: Value = serde_json::from_str(r#"{"c": 150.25, "o": 149.0}"#).unwrap();
        assert!(vendor_error_message(&body).is_none());
    }

    #[test]
    fn test_vendor_error_message_absent_on_array() {
        let body: Value = serde_json::from_str(r#"[{"headline": "x"}]"#).unwrap();
        assert!(vendor_error_message(&body).is_none());
    }

    #[test]
    fn test_resolution_wire_values() {
        assert_eq!(Resolution::Min1.as_str(), "1");
        assert_eq!(Resolution::Min60.as_str(), "60");
        assert_eq!(Resolution::Daily.as_str(), "D");
        assert_eq!(Resolution::Weekly.as_str(), "W");
        assert_eq!(Resolution::Monthly.as_str(), "M");
    }

    #[test]
    fn test_news_category_wire_values() {
        assert_eq!(NewsCategory::General.as_str(), "general");
        assert_eq!(NewsCategory::Forex.as_str(), "forex");
        assert_eq!(NewsCategory::Crypto.as_str(), "crypto");
        assert_eq!(NewsCategory::Merger.as_str(), "merger");
    }
}
