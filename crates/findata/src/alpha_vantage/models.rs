//! Typed response records for the Alpha Vantage API.
//!
//! Alpha Vantage returns every numeric value as a JSON string, keyed by
//! positional names like `"1. open"`. The raw serde shapes here absorb that
//! wire format; the public records expose parsed `Decimal`/date fields.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::ApiError;

use super::{decode_err, vendor_err};

// ============================================================================
// Time series
// ============================================================================

/// One entry of a daily/weekly/monthly time series.
#[derive(Clone, Debug, Serialize)]
pub struct SeriesBar {
    /// Trading day
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Adjusted close, present on `*_ADJUSTED` series
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_close: Option<Decimal>,
    pub volume: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_coefficient: Option<Decimal>,
}

/// One entry of an intraday time series.
#[derive(Clone, Debug, Serialize)]
pub struct IntradayBar {
    /// Bar timestamp in the exchange's local time
    pub timestamp: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Raw series entry; the key set varies with the `function` requested.
/// Adjusted series shift volume to `"6. volume"`.
#[derive(Debug, Deserialize)]
struct RawSeriesEntry {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. adjusted close")]
    adjusted_close: Option<String>,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
    #[serde(rename = "6. volume")]
    adjusted_volume: Option<String>,
    #[serde(rename = "7. dividend amount")]
    dividend_amount: Option<String>,
    #[serde(rename = "8. split coefficient")]
    split_coefficient: Option<String>,
}

impl RawSeriesEntry {
    fn volume(&self) -> Option<&str> {
        self.volume.as_deref().or(self.adjusted_volume.as_deref())
    }
}

/// Locate the time series section of a response.
///
/// The section key encodes the requested function (`"Time Series (Daily)"`,
/// `"Weekly Adjusted Time Series"`, `"Time Series (5min)"`, ...), so any
/// object-valued section other than `"Meta Data"` is taken as the series.
fn extract_series(value: &Value) -> Result<HashMap<String, RawSeriesEntry>, ApiError> {
    let obj = value
        .as_object()
        .ok_or_else(|| decode_err("expected a JSON object"))?;

    for (key, section) in obj {
        if key == "Meta Data" || !section.is_object() {
            continue;
        }
        return serde_json::from_value(section.clone())
            .map_err(|e| decode_err(format!("malformed time series: {}", e)));
    }

    Err(vendor_err("no time series data in response"))
}

/// Decode a daily/weekly/monthly series into chronologically ascending bars.
/// Entries with unparsable dates or prices are skipped.
pub(crate) fn parse_series(value: &Value) -> Result<Vec<SeriesBar>, ApiError> {
    let series = extract_series(value)?;

    let mut bars: Vec<SeriesBar> = series
        .into_iter()
        .filter_map(|(date_str, raw)| {
            let date = parse_date(&date_str)?;
            let volume = parse_decimal(raw.volume()?)?;
            Some(SeriesBar {
                date,
                open: parse_decimal(&raw.open)?,
                high: parse_decimal(&raw.high)?,
                low: parse_decimal(&raw.low)?,
                close: parse_decimal(&raw.close)?,
                adjusted_close: raw.adjusted_close.as_deref().and_then(parse_decimal),
                volume,
                dividend_amount: raw.dividend_amount.as_deref().and_then(parse_decimal),
                split_coefficient: raw.split_coefficient.as_deref().and_then(parse_decimal),
            })
        })
        .collect();

    bars.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(bars)
}

/// Decode an intraday series into chronologically ascending bars.
pub(crate) fn parse_intraday(value: &Value) -> Result<Vec<IntradayBar>, ApiError> {
    let series = extract_series(value)?;

    let mut bars: Vec<IntradayBar> = series
        .into_iter()
        .filter_map(|(ts_str, raw)| {
            let timestamp = parse_datetime(&ts_str)?;
            let volume = parse_decimal(raw.volume()?)?;
            Some(IntradayBar {
                timestamp,
                open: parse_decimal(&raw.open)?,
                high: parse_decimal(&raw.high)?,
                low: parse_decimal(&raw.low)?,
                close: parse_decimal(&raw.close)?,
                volume,
            })
        })
        .collect();

    bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    Ok(bars)
}

// ============================================================================
// Global quote
// ============================================================================

/// GLOBAL_QUOTE result.
#[derive(Clone, Debug, Serialize)]
pub struct GlobalQuote {
    pub symbol: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub price: Decimal,
    pub volume: Decimal,
    pub latest_trading_day: NaiveDate,
    pub previous_close: Decimal,
    pub change: Decimal,
    /// Raw vendor string, e.g. `"1.2044%"`
    pub change_percent: String,
}

impl GlobalQuote {
    /// Change percent as a number (the vendor appends a `%` sign).
    pub fn change_percent_value(&self) -> Option<Decimal> {
        parse_decimal(self.change_percent.trim_end_matches('%'))
    }
}

#[derive(Debug, Deserialize)]
struct RawGlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: String,
    #[serde(rename = "02. open")]
    open: String,
    #[serde(rename = "03. high")]
    high: String,
    #[serde(rename = "04. low")]
    low: String,
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume")]
    volume: String,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: String,
    #[serde(rename = "08. previous close")]
    previous_close: String,
    #[serde(rename = "09. change")]
    change: String,
    #[serde(rename = "10. change percent")]
    change_percent: String,
}

/// Decode a GLOBAL_QUOTE response.
///
/// The vendor answers unknown symbols with HTTP 200 and an empty
/// `"Global Quote"` object, which classifies as a vendor failure here.
pub(crate) fn parse_global_quote(value: &Value) -> Result<GlobalQuote, ApiError> {
    let section = value
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|obj| !obj.is_empty())
        .ok_or_else(|| vendor_err("no quote data in response"))?;

    let raw: RawGlobalQuote = serde_json::from_value(Value::Object(section.clone()))
        .map_err(|e| decode_err(format!("malformed quote: {}", e)))?;

    let field = |s: &str, name: &str| {
        parse_decimal(s).ok_or_else(|| decode_err(format!("invalid {}: {}", name, s)))
    };

    Ok(GlobalQuote {
        open: field(&raw.open, "open")?,
        high: field(&raw.high, "high")?,
        low: field(&raw.low, "low")?,
        price: field(&raw.price, "price")?,
        volume: field(&raw.volume, "volume")?,
        latest_trading_day: parse_date(&raw.latest_trading_day).ok_or_else(|| {
            decode_err(format!("invalid trading day: {}", raw.latest_trading_day))
        })?,
        previous_close: field(&raw.previous_close, "previous close")?,
        change: field(&raw.change, "change")?,
        symbol: raw.symbol,
        change_percent: raw.change_percent,
    })
}

// ============================================================================
// Symbol search
// ============================================================================

/// One SYMBOL_SEARCH match.
#[derive(Clone, Debug, Serialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    /// Security type (e.g., "Equity", "ETF")
    pub security_type: String,
    pub region: String,
    pub market_open: String,
    pub market_close: String,
    pub timezone: String,
    pub currency: String,
    /// Relevance score in `[0, 1]`
    pub match_score: f64,
}

#[derive(Debug, Deserialize)]
struct RawSymbolMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "3. type")]
    security_type: String,
    #[serde(rename = "4. region")]
    region: String,
    #[serde(rename = "5. marketOpen")]
    market_open: String,
    #[serde(rename = "6. marketClose")]
    market_close: String,
    #[serde(rename = "7. timezone")]
    timezone: String,
    #[serde(rename = "8. currency")]
    currency: String,
    #[serde(rename = "9. matchScore")]
    match_score: String,
}

pub(crate) fn parse_symbol_search(value: &Value) -> Result<Vec<SymbolMatch>, ApiError> {
    let matches = value
        .get("bestMatches")
        .cloned()
        .ok_or_else(|| decode_err("no bestMatches in response"))?;

    let raw: Vec<RawSymbolMatch> = serde_json::from_value(matches)
        .map_err(|e| decode_err(format!("malformed search results: {}", e)))?;

    Ok(raw
        .into_iter()
        .map(|m| SymbolMatch {
            match_score: m.match_score.parse().unwrap_or(0.0),
            symbol: m.symbol,
            name: m.name,
            security_type: m.security_type,
            region: m.region,
            market_open: m.market_open,
            market_close: m.market_close,
            timezone: m.timezone,
            currency: m.currency,
        })
        .collect())
}

// ============================================================================
// Company fundamentals
// ============================================================================

/// OVERVIEW result.
/// Only the commonly used fields are mapped; the API returns many more.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "AssetType")]
    pub asset_type: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Exchange")]
    pub exchange: Option<String>,
    #[serde(rename = "Currency")]
    pub currency: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    #[serde(rename = "Industry")]
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization", default, deserialize_with = "lenient_f64")]
    pub market_capitalization: Option<f64>,
    #[serde(rename = "EBITDA", default, deserialize_with = "lenient_f64")]
    pub ebitda: Option<f64>,
    #[serde(rename = "PERatio", default, deserialize_with = "lenient_f64")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "PEGRatio", default, deserialize_with = "lenient_f64")]
    pub peg_ratio: Option<f64>,
    #[serde(rename = "BookValue", default, deserialize_with = "lenient_f64")]
    pub book_value: Option<f64>,
    #[serde(rename = "DividendPerShare", default, deserialize_with = "lenient_f64")]
    pub dividend_per_share: Option<f64>,
    #[serde(rename = "DividendYield", default, deserialize_with = "lenient_f64")]
    pub dividend_yield: Option<f64>,
    #[serde(rename = "EPS", default, deserialize_with = "lenient_f64")]
    pub eps: Option<f64>,
    #[serde(rename = "Beta", default, deserialize_with = "lenient_f64")]
    pub beta: Option<f64>,
    #[serde(rename = "52WeekHigh", default, deserialize_with = "lenient_f64")]
    pub week_52_high: Option<f64>,
    #[serde(rename = "52WeekLow", default, deserialize_with = "lenient_f64")]
    pub week_52_low: Option<f64>,
    #[serde(rename = "SharesOutstanding", default, deserialize_with = "lenient_f64")]
    pub shares_outstanding: Option<f64>,
}

/// Annual and quarterly reports for one fundamentals endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FundamentalReports<T> {
    pub symbol: String,
    #[serde(rename = "annualReports")]
    pub annual: Vec<T>,
    #[serde(rename = "quarterlyReports")]
    pub quarterly: Vec<T>,
}

/// One INCOME_STATEMENT report.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub fiscal_date_ending: NaiveDate,
    pub reported_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_revenue: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub gross_profit: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub operating_income: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub income_before_tax: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub net_income: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub ebit: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub ebitda: Option<Decimal>,
}

/// One BALANCE_SHEET report.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub fiscal_date_ending: NaiveDate,
    pub reported_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_assets: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_current_assets: Option<Decimal>,
    #[serde(
        rename = "cashAndCashEquivalentsAtCarryingValue",
        default,
        deserialize_with = "lenient_decimal"
    )]
    pub cash_and_equivalents: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_liabilities: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_current_liabilities: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub long_term_debt: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_shareholder_equity: Option<Decimal>,
    #[serde(
        rename = "commonStockSharesOutstanding",
        default,
        deserialize_with = "lenient_decimal"
    )]
    pub shares_outstanding: Option<Decimal>,
}

/// One CASH_FLOW report.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub fiscal_date_ending: NaiveDate,
    pub reported_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub operating_cashflow: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub capital_expenditures: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cashflow_from_investment: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cashflow_from_financing: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub dividend_payout: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub net_income: Option<Decimal>,
}

/// EARNINGS result: annual EPS plus quarterly surprises.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EarningsHistory {
    pub symbol: String,
    #[serde(rename = "annualEarnings")]
    pub annual: Vec<AnnualEarnings>,
    #[serde(rename = "quarterlyEarnings")]
    pub quarterly: Vec<QuarterlyEarnings>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AnnualEarnings {
    #[serde(rename = "fiscalDateEnding")]
    pub fiscal_date_ending: NaiveDate,
    #[serde(rename = "reportedEPS", default, deserialize_with = "lenient_decimal")]
    pub reported_eps: Option<Decimal>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuarterlyEarnings {
    #[serde(rename = "fiscalDateEnding")]
    pub fiscal_date_ending: NaiveDate,
    #[serde(rename = "reportedDate", default)]
    pub reported_date: Option<NaiveDate>,
    #[serde(rename = "reportedEPS", default, deserialize_with = "lenient_decimal")]
    pub reported_eps: Option<Decimal>,
    #[serde(rename = "estimatedEPS", default, deserialize_with = "lenient_decimal")]
    pub estimated_eps: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub surprise: Option<Decimal>,
    #[serde(rename = "surprisePercentage", default, deserialize_with = "lenient_decimal")]
    pub surprise_percentage: Option<Decimal>,
}

// ============================================================================
// Market movers
// ============================================================================

/// TOP_GAINERS_LOSERS result.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MarketMovers {
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub top_gainers: Vec<Mover>,
    #[serde(default)]
    pub top_losers: Vec<Mover>,
    #[serde(default)]
    pub most_actively_traded: Vec<Mover>,
}

/// One market mover entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Mover {
    pub ticker: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub change_amount: Option<Decimal>,
    /// Raw vendor string, e.g. `"27.78%"`
    #[serde(default)]
    pub change_percentage: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub volume: Option<Decimal>,
}

impl Mover {
    /// Change percentage as a number (the vendor appends a `%` sign).
    pub fn change_percentage_value(&self) -> Option<Decimal> {
        self.change_percentage
            .as_deref()
            .and_then(|s| parse_decimal(s.trim_end_matches('%')))
    }
}

// ============================================================================
// News sentiment
// ============================================================================

/// NEWS_SENTIMENT result.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewsSentiment {
    /// Number of articles matched, as reported by the vendor
    #[serde(default)]
    pub items: Option<String>,
    #[serde(default)]
    pub feed: Vec<NewsArticle>,
}

/// One news article with sentiment scores.
/// A subset of the feed entry; the API returns more fields.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    /// Vendor compact timestamp, `YYYYMMDDTHHMMSS`
    #[serde(default)]
    pub time_published: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub overall_sentiment_score: Option<f64>,
    #[serde(default)]
    pub overall_sentiment_label: Option<String>,
    #[serde(default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

/// Per-ticker sentiment within an article.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TickerSentiment {
    pub ticker: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub relevance_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ticker_sentiment_score: Option<f64>,
    #[serde(default)]
    pub ticker_sentiment_label: Option<String>,
}

// ============================================================================
// Parse helpers
// ============================================================================

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse an intraday timestamp, `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
}

/// Parse a decimal value from a string.
pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok()
}

/// Lenient numeric parse: the fundamentals endpoints report absent values
/// as `"None"` or `"-"`.
fn parse_lenient(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "None" || trimmed == "-" {
        None
    } else {
        Some(trimmed)
    }
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(parse_lenient)
        .and_then(|s| Decimal::from_str(s).ok()))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(parse_lenient)
        .and_then(|s| s.parse().ok()))
}
