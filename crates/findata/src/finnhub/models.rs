//! Typed response records for the Finnhub API.
//!
//! Finnhub returns conventional JSON (numbers as numbers, camelCase keys),
//! so most records decode directly via serde. The candle endpoint is the
//! exception: it answers with parallel arrays plus a status field, which
//! [`CandleResponse::into_candles`] validates and zips into [`Candle`]s.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::ApiError;

use super::{decode_err, vendor_err};

// ============================================================================
// Quote
// ============================================================================

/// Real-time quote from `/quote`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Quote {
    /// Current price
    #[serde(rename = "c")]
    pub current: f64,
    /// Change since previous close
    #[serde(rename = "d", default)]
    pub change: Option<f64>,
    /// Percent change since previous close
    #[serde(rename = "dp", default)]
    pub percent_change: Option<f64>,
    /// High price of the day
    #[serde(rename = "h", default)]
    pub high: Option<f64>,
    /// Low price of the day
    #[serde(rename = "l", default)]
    pub low: Option<f64>,
    /// Open price of the day
    #[serde(rename = "o", default)]
    pub open: Option<f64>,
    /// Previous close price
    #[serde(rename = "pc", default)]
    pub previous_close: Option<f64>,
    /// Quote timestamp (Unix seconds)
    #[serde(rename = "t", default)]
    pub timestamp: Option<i64>,
}

impl Quote {
    /// Finnhub answers unknown symbols with HTTP 200 and all-zero prices
    /// instead of an error.
    pub fn has_data(&self) -> bool {
        !(self.current == 0.0 && self.open.unwrap_or(0.0) == 0.0)
    }

    /// Quote timestamp as a UTC datetime.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }
}

// ============================================================================
// Candles
// ============================================================================

/// One OHLCV candle.
#[derive(Clone, Debug, Serialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// Raw `/stock/candle` response: parallel arrays plus a status field.
#[derive(Debug, Deserialize)]
pub(crate) struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
}

impl CandleResponse {
    /// Validate the arrays and zip them into candles, ascending by time.
    /// Entries with invalid timestamps are skipped.
    pub(crate) fn into_candles(self) -> Result<Vec<Candle>, ApiError> {
        if self.s == "no_data" {
            return Err(vendor_err("no candle data for range"));
        }
        if self.s != "ok" {
            return Err(vendor_err(format!("unexpected candle status: {}", self.s)));
        }

        let len = self.t.len();
        if self.c.len() != len
            || self.o.len() != len
            || self.h.len() != len
            || self.l.len() != len
        {
            return Err(decode_err("mismatched array lengths in candle response"));
        }

        if len == 0 {
            return Err(vendor_err("no candle data for range"));
        }

        let mut candles = Vec::with_capacity(len);
        for i in 0..len {
            let timestamp = match Utc.timestamp_opt(self.t[i], 0).single() {
                Some(ts) => ts,
                None => {
                    warn!("invalid candle timestamp at index {}: {}", i, self.t[i]);
                    continue;
                }
            };

            candles.push(Candle {
                timestamp,
                open: self.o[i],
                high: self.h[i],
                low: self.l[i],
                close: self.c[i],
                volume: self.v.get(i).copied(),
            });
        }

        candles.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(candles)
    }
}

// ============================================================================
// Company profile
// ============================================================================

/// Company profile from `/stock/profile2`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// IPO date
    #[serde(default)]
    pub ipo: Option<NaiveDate>,
    /// Finnhub industry classification
    #[serde(default)]
    pub finnhub_industry: Option<String>,
    /// Market capitalization, in millions
    #[serde(default)]
    pub market_capitalization: Option<f64>,
    /// Shares outstanding, in millions
    #[serde(default)]
    pub share_outstanding: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub weburl: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl CompanyProfile {
    /// Unknown symbols come back as an empty object.
    pub fn has_data(&self) -> bool {
        self.name.is_some() || self.ticker.is_some()
    }
}

// ============================================================================
// News
// ============================================================================

/// One article from `/news` or `/company-news`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewsArticle {
    pub id: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub datetime: DateTime<Utc>,
    pub headline: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Related symbols, comma-separated
    #[serde(default)]
    pub related: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub url: String,
}

// ============================================================================
// Analyst data
// ============================================================================

/// One month of analyst recommendations from `/stock/recommendation`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationTrend {
    pub symbol: String,
    pub period: NaiveDate,
    pub strong_buy: i64,
    pub buy: i64,
    pub hold: i64,
    pub sell: i64,
    pub strong_sell: i64,
}

/// Analyst price targets from `/stock/price-target`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTarget {
    pub symbol: String,
    #[serde(default)]
    pub target_high: Option<f64>,
    #[serde(default)]
    pub target_low: Option<f64>,
    #[serde(default)]
    pub target_mean: Option<f64>,
    #[serde(default)]
    pub target_median: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// One quarterly earnings surprise from `/stock/earnings`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSurprise {
    pub symbol: String,
    pub period: NaiveDate,
    #[serde(default)]
    pub quarter: Option<i64>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub actual: Option<f64>,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub surprise: Option<f64>,
    #[serde(default)]
    pub surprise_percent: Option<f64>,
}

// ============================================================================
// Financials
// ============================================================================

/// Filings with as-reported statements from `/stock/financials-reported`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FinancialsReported {
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub data: Vec<FinancialFiling>,
}

/// One filing.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialFiling {
    #[serde(default)]
    pub access_number: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub cik: Option<String>,
    pub year: i64,
    pub quarter: i64,
    /// SEC form type, e.g. "10-K"
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub filed_date: Option<String>,
    #[serde(default)]
    pub report: Option<FinancialStatements>,
}

/// Statement sections of a filing.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FinancialStatements {
    /// Balance sheet lines
    #[serde(default)]
    pub bs: Vec<FinancialLine>,
    /// Cash flow lines
    #[serde(default)]
    pub cf: Vec<FinancialLine>,
    /// Income statement lines
    #[serde(default)]
    pub ic: Vec<FinancialLine>,
}

/// One reported line item. `value` is a number for amounts but can be a
/// string like "N/A" in older filings, so it stays a raw JSON value.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FinancialLine {
    pub concept: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl FinancialLine {
    pub fn value_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
}

/// Metric map from `/stock/metric`.
///
/// The vendor exposes hundreds of named metrics; they are kept as a dynamic
/// map with a typed accessor rather than hundreds of struct fields.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BasicFinancials {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub metric_type: Option<String>,
    #[serde(default)]
    pub metric: HashMap<String, Value>,
}

impl BasicFinancials {
    /// Look up a numeric metric, e.g. `"peBasicExclExtraTTM"`.
    pub fn metric_f64(&self, key: &str) -> Option<f64> {
        self.metric.get(key).and_then(Value::as_f64)
    }
}

// ============================================================================
// Insider transactions
// ============================================================================

/// Insider transactions from `/stock/insider-transactions`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InsiderTransactions {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub data: Vec<InsiderTransaction>,
}

/// One insider transaction.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderTransaction {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Shares held after the transaction
    #[serde(default)]
    pub share: Option<i64>,
    /// Share count change, negative for disposals
    #[serde(default)]
    pub change: Option<i64>,
    #[serde(default)]
    pub filing_date: Option<NaiveDate>,
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
    /// SEC transaction code, e.g. "S" for sale
    #[serde(default)]
    pub transaction_code: Option<String>,
    #[serde(default)]
    pub transaction_price: Option<f64>,
}

// ============================================================================
// Symbols and search
// ============================================================================

/// One listed symbol from `/stock/symbol`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub display_symbol: String,
    pub description: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub figi: Option<String>,
    #[serde(default)]
    pub mic: Option<String>,
    #[serde(rename = "type", default)]
    pub security_type: Option<String>,
}

/// `/search` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) result: Vec<SearchItem>,
}

/// One symbol search result.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub symbol: String,
    pub display_symbol: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub security_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_parsing() {
        let json = r#"{
            "c": 150.25,
            "d": 1.50,
            "dp": 1.01,
            "h": 152.00,
            "l": 148.50,
            "o": 149.00,
            "pc": 148.75,
            "t": 1704067200
        }"#;

        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.current, 150.25);
        assert_eq!(quote.open, Some(149.00));
        assert_eq!(quote.previous_close, Some(148.75));
        assert!(quote.has_data());
        assert_eq!(quote.time().unwrap().timestamp(), 1704067200);
    }

    #[test]
    fn test_quote_zero_prices_has_no_data() {
        let json = r#"{"c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert!(!quote.has_data());
    }

    #[test]
    fn test_candles_zipped_and_sorted() {
        let json = r#"{
            "s": "ok",
            "c": [151.0, 150.0, 152.0],
            "h": [152.0, 151.0, 153.0],
            "l": [150.0, 149.0, 151.0],
            "o": [150.5, 149.5, 151.5],
            "v": [1100000, 1000000, 1200000],
            "t": [1704153600, 1704067200, 1704240000]
        }"#;

        let response: CandleResponse = serde_json::from_str(json).unwrap();
        let candles = response.into_candles().unwrap();
        assert_eq!(candles.len(), 3);
        assert!(candles[0].timestamp < candles[1].timestamp);
        assert_eq!(candles[0].close, 150.0);
        assert_eq!(candles[2].volume, Some(1200000.0));
    }

    #[test]
    fn test_candles_no_data() {
        let json = r#"{"s": "no_data"}"#;
        let response: CandleResponse = serde_json::from_str(json).unwrap();
        let err = response.into_candles().unwrap_err();
        assert!(matches!(err, ApiError::Vendor { .. }));
    }

    #[test]
    fn test_candles_mismatched_lengths() {
        let json = r#"{
            "s": "ok",
            "c": [150.0, 151.0],
            "h": [152.0],
            "l": [149.0],
            "o": [149.5],
            "v": [1000000],
            "t": [1704067200]
        }"#;

        let response: CandleResponse = serde_json::from_str(json).unwrap();
        let err = response.into_candles().unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn test_profile_parsing() {
        let json = r#"{
            "name": "Apple Inc",
            "ticker": "AAPL",
            "exchange": "NASDAQ NMS - GLOBAL MARKET",
            "currency": "USD",
            "country": "US",
            "ipo": "1980-12-12",
            "finnhubIndustry": "Technology",
            "marketCapitalization": 2800000,
            "shareOutstanding": 15550,
            "weburl": "https://www.apple.com/",
            "logo": "https://static.finnhub.io/logo/aapl.png"
        }"#;

        let profile: CompanyProfile = serde_json::from_str(json).unwrap();
        assert!(profile.has_data());
        assert_eq!(profile.name.as_deref(), Some("Apple Inc"));
        assert_eq!(profile.ipo, NaiveDate::from_ymd_opt(1980, 12, 12));
        assert_eq!(profile.market_capitalization, Some(2800000.0));
        assert_eq!(profile.finnhub_industry.as_deref(), Some("Technology"));
    }

    #[test]
    fn test_empty_profile_has_no_data() {
        let profile: CompanyProfile = serde_json::from_str("{}").unwrap();
        assert!(!profile.has_data());
    }

    #[test]
    fn test_news_article_datetime() {
        let json = r#"{
            "category": "company",
            "datetime": 1704067200,
            "headline": "Apple unveils new chips",
            "id": 7465421,
            "image": "",
            "related": "AAPL",
            "source": "Example Wire",
            "summary": "New silicon announced.",
            "url": "https://example.com/article"
        }"#;

        let article: NewsArticle = serde_json::from_str(json).unwrap();
        assert_eq!(article.datetime.timestamp(), 1704067200);
        assert_eq!(article.headline, "Apple unveils new chips");
        assert_eq!(article.related.as_deref(), Some("AAPL"));
    }

    #[test]
    fn test_recommendation_trend_parsing() {
        let json = r#"{
            "buy": 24,
            "hold": 7,
            "period": "2024-01-01",
            "sell": 0,
            "strongBuy": 13,
            "strongSell": 0,
            "symbol": "AAPL"
        }"#;

        let trend: RecommendationTrend = serde_json::from_str(json).unwrap();
        assert_eq!(trend.strong_buy, 13);
        assert_eq!(trend.period, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_price_target_parsing() {
        let json = r#"{
            "lastUpdated": "2024-01-12 22:01:00",
            "symbol": "AAPL",
            "targetHigh": 250.0,
            "targetLow": 160.0,
            "targetMean": 200.5,
            "targetMedian": 195.0
        }"#;

        let target: PriceTarget = serde_json::from_str(json).unwrap();
        assert_eq!(target.target_mean, Some(200.5));
        assert_eq!(target.last_updated.as_deref(), Some("2024-01-12 22:01:00"));
    }

    #[test]
    fn test_earnings_surprise_parsing() {
        let json = r#"{
            "actual": 2.18,
            "estimate": 2.10,
            "period": "2023-12-31",
            "quarter": 4,
            "surprise": 0.08,
            "surprisePercent": 3.81,
            "symbol": "AAPL",
            "year": 2023
        }"#;

        let surprise: EarningsSurprise = serde_json::from_str(json).unwrap();
        assert_eq!(surprise.actual, Some(2.18));
        assert_eq!(surprise.quarter, Some(4));
    }

    #[test]
    fn test_financials_reported_parsing() {
        let json = r#"{
            "cik": "320193",
            "symbol": "AAPL",
            "data": [
                {
                    "accessNumber": "0000320193-23-000106",
                    "symbol": "AAPL",
                    "cik": "320193",
                    "year": 2023,
                    "quarter": 0,
                    "form": "10-K",
                    "startDate": "2022-09-25 00:00:00",
                    "endDate": "2023-09-30 00:00:00",
                    "filedDate": "2023-11-03 00:00:00",
                    "report": {
                        "bs": [
                            {"concept": "us-gaap_Assets", "label": "Total assets", "unit": "usd", "value": 352583000000.0}
                        ],
                        "cf": [],
                        "ic": [
                            {"concept": "us-gaap_Revenues", "label": "Revenue", "unit": "usd", "value": "N/A"}
                        ]
                    }
                }
            ]
        }"#;

        let financials: FinancialsReported = serde_json::from_str(json).unwrap();
        assert_eq!(financials.data.len(), 1);
        let filing = &financials.data[0];
        assert_eq!(filing.form.as_deref(), Some("10-K"));
        let report = filing.report.as_ref().unwrap();
        assert_eq!(report.bs[0].value_f64(), Some(352583000000.0));
        assert_eq!(report.ic[0].value_f64(), None);
    }

    #[test]
    fn test_basic_financials_metric_lookup() {
        let json = r#"{
            "symbol": "AAPL",
            "metricType": "all",
            "metric": {
                "peBasicExclExtraTTM": 28.5,
                "52WeekHigh": 199.62,
                "beta": 1.29,
                "marketCapitalization": 2800000
            }
        }"#;

        let financials: BasicFinancials = serde_json::from_str(json).unwrap();
        assert_eq!(financials.metric_f64("peBasicExclExtraTTM"), Some(28.5));
        assert_eq!(financials.metric_f64("beta"), Some(1.29));
        assert_eq!(financials.metric_f64("missing"), None);
    }

    #[test]
    fn test_insider_transactions_parsing() {
        let json = r#"{
            "symbol": "AAPL",
            "data": [
                {
                    "name": "Cook Timothy D",
                    "share": 3280180,
                    "change": -511000,
                    "filingDate": "2024-01-12",
                    "transactionDate": "2024-01-10",
                    "transactionCode": "S",
                    "transactionPrice": 185.02,
                    "symbol": "AAPL"
                }
            ]
        }"#;

        let transactions: InsiderTransactions = serde_json::from_str(json).unwrap();
        let tx = &transactions.data[0];
        assert_eq!(tx.change, Some(-511000));
        assert_eq!(tx.transaction_code.as_deref(), Some("S"));
        assert_eq!(tx.filing_date, NaiveDate::from_ymd_opt(2024, 1, 12));
    }

    #[test]
    fn test_symbol_info_parsing() {
        let json = r#"{
            "currency": "USD",
            "description": "APPLE INC",
            "displaySymbol": "AAPL",
            "figi": "BBG000B9XRY4",
            "mic": "XNAS",
            "symbol": "AAPL",
            "type": "Common Stock"
        }"#;

        let info: SymbolInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.symbol, "AAPL");
        assert_eq!(info.mic.as_deref(), Some("XNAS"));
        assert_eq!(info.security_type.as_deref(), Some("Common Stock"));
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "count": 2,
            "result": [
                {
                    "description": "Apple Inc",
                    "displaySymbol": "AAPL",
                    "symbol": "AAPL",
                    "type": "Common Stock"
                },
                {
                    "description": "Apple Hospitality REIT Inc",
                    "displaySymbol": "APLE",
                    "symbol": "APLE",
                    "type": "REIT"
                }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.result.len(), 2);
        assert_eq!(response.result[0].symbol, "AAPL");
        assert_eq!(response.result[1].security_type.as_deref(), Some("REIT"));
    }
}
