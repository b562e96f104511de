//! Side-by-side comparison of Alpha Vantage and Finnhub data for one symbol.
//!
//! Usage: `findata-cli [SYMBOL]` (defaults to AAPL). Requires
//! `ALPHA_VANTAGE_API_KEY` and `FINNHUB_API_KEY`, from the environment or a
//! local `.env` file.

use std::time::Duration;

use anyhow::bail;
use rust_decimal::prelude::ToPrimitive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use findata::{AlphaVantageClient, FinnhubClient, Settings};

// Free-tier vendors; pause between calls instead of burning the quota.
const CALL_DELAY: Duration = Duration::from_secs(1);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn print_config_status(settings: &Settings) {
    let status = |configured: bool| if configured { "configured" } else { "MISSING" };
    println!("Configuration:");
    println!(
        "  Alpha Vantage API key: {}",
        status(settings.alpha_vantage_api_key.is_some())
    );
    println!(
        "  Finnhub API key:       {}",
        status(settings.finnhub_api_key.is_some())
    );
    println!("  Request timeout:       {:?}", settings.request_timeout);
    println!("  Max retries:           {}", settings.max_retries);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = Settings::from_env();
    print_config_status(&settings);

    if !settings.is_configured() {
        bail!(
            "missing API keys; set ALPHA_VANTAGE_API_KEY and FINNHUB_API_KEY \
             in the environment or a .env file"
        );
    }

    let symbol = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "AAPL".to_string());

    let alpha = AlphaVantageClient::from_settings(&settings)?;
    let finnhub = FinnhubClient::from_settings(&settings)?;

    tracing::info!("fetching quotes for {}", symbol);
    println!("\nComparing {} across both vendors", symbol);

    let mut alpha_price = None;
    match alpha.quote(&symbol).await {
        Ok(quote) => {
            alpha_price = quote.price.to_f64();
            println!("\nAlpha Vantage:");
            println!("  Price:  {}", quote.price);
            println!(
                "  Change: {} ({})",
                quote.change,
                quote.change_percent
            );
            println!("  Volume: {}", quote.volume);
        }
        Err(err) => println!("\nAlpha Vantage quote unavailable: {}", err),
    }

    tokio::time::sleep(CALL_DELAY).await;

    let mut finnhub_price = None;
    match finnhub.quote(&symbol).await {
        Ok(quote) => {
            finnhub_price = Some(quote.current);
            println!("\nFinnhub:");
            println!("  Price:  {}", quote.current);
            if let (Some(change), Some(percent)) = (quote.change, quote.percent_change) {
                println!("  Change: {} ({:.2}%)", change, percent);
            }
        }
        Err(err) => println!("\nFinnhub quote unavailable: {}", err),
    }

    if let (Some(a), Some(f)) = (alpha_price, finnhub_price) {
        println!("\nPrice difference between vendors: {:.2}", (a - f).abs());
    }

    tokio::time::sleep(CALL_DELAY).await;

    match alpha.company_overview(&symbol).await {
        Ok(overview) => {
            println!("\nCompany overview (Alpha Vantage):");
            if let Some(name) = overview.name {
                println!("  Name:       {}", name);
            }
            if let Some(sector) = overview.sector {
                println!("  Sector:     {}", sector);
            }
            if let Some(market_cap) = overview.market_capitalization {
                println!("  Market cap: {:.0}", market_cap);
            }
            if let Some(pe) = overview.pe_ratio {
                println!("  P/E:        {:.2}", pe);
            }
        }
        Err(err) => println!("\nCompany overview unavailable: {}", err),
    }

    tokio::time::sleep(CALL_DELAY).await;

    match finnhub.company_profile(&symbol).await {
        Ok(profile) => {
            println!("\nCompany profile (Finnhub):");
            if let Some(name) = profile.name {
                println!("  Name:     {}", name);
            }
            if let Some(industry) = profile.finnhub_industry {
                println!("  Industry: {}", industry);
            }
            if let Some(market_cap) = profile.market_capitalization {
                println!("  Market cap (millions): {:.0}", market_cap);
            }
            if let Some(weburl) = profile.weburl {
                println!("  Web:      {}", weburl);
            }
        }
        Err(err) => println!("\nCompany profile unavailable: {}", err),
    }

    Ok(())
}
