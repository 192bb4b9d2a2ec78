//! Yahoo Finance chart API client for market data (no authentication required)

use anyhow::Result;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::Bar;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// ============================================================================
// Index catalog
// ============================================================================

/// Exchange an index belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Nse,
    Bse,
}

/// A supported market index: friendly name plus its Yahoo ticker
#[derive(Debug, Clone, Copy)]
pub struct IndexInfo {
    pub name: &'static str,
    pub ticker: &'static str,
    pub exchange: Exchange,
}

/// Every index the service knows how to quote
pub const INDICES: &[IndexInfo] = &[
    IndexInfo { name: "NIFTY 50", ticker: "^NSEI", exchange: Exchange::Nse },
    IndexInfo { name: "NIFTY BANK", ticker: "^NSEBANK", exchange: Exchange::Nse },
    IndexInfo { name: "NIFTY IT", ticker: "^CNXIT", exchange: Exchange::Nse },
    IndexInfo { name: "NIFTY AUTO", ticker: "^CNXAUTO", exchange: Exchange::Nse },
    IndexInfo { name: "NIFTY PHARMA", ticker: "^CNXPHARMA", exchange: Exchange::Nse },
    IndexInfo { name: "NIFTY FMCG", ticker: "^CNXFMCG", exchange: Exchange::Nse },
    IndexInfo { name: "NIFTY METAL", ticker: "^CNXMETAL", exchange: Exchange::Nse },
    IndexInfo { name: "SENSEX", ticker: "^BSESN", exchange: Exchange::Bse },
    IndexInfo { name: "BSE 100", ticker: "^BSE100", exchange: Exchange::Bse },
    IndexInfo { name: "BSE 200", ticker: "^BSE200", exchange: Exchange::Bse },
];

/// Look up an index by its friendly name
pub fn resolve_index(symbol: &str) -> Option<&'static IndexInfo> {
    INDICES.iter().find(|i| i.name == symbol)
}

// ============================================================================
// Wire types
// ============================================================================

/// Real-time snapshot for one index, derived from the last two daily bars
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuote {
    pub symbol: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: u64,
    pub high: Decimal,
    pub low: Decimal,
    pub open: Decimal,
    pub exchange: Exchange,
}

/// Raw chart response from Yahoo (only the fields we read)
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

// ============================================================================
// Client
// ============================================================================

/// Yahoo Finance public market data client
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooFinanceClient {
    /// Create a new client with the default base URL
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a non-default base URL (tests, proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// Fetch historical bars for an index over the given range/interval
    /// (e.g. "1y" / "1d"). Rows with missing OHLC values are skipped.
    pub async fn history(&self, symbol: &str, range: &str, interval: &str) -> Result<Vec<Bar>> {
        let index =
            resolve_index(symbol).ok_or_else(|| anyhow::anyhow!("Unknown symbol: {symbol}"))?;

        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url,
            index.ticker.replace('^', "%5E"),
            range,
            interval
        );

        debug!(symbol, range, interval, "Fetching history from Yahoo");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Yahoo API error {}: {}", status, body);
        }

        let chart: ChartResponse = response.json().await?;
        let bars = chart
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .map(bars_from_chart)
            .unwrap_or_default();

        debug!(count = bars.len(), "Fetched bars");
        Ok(bars)
    }

    /// Current quote for an index, derived from its last two daily closes
    pub async fn quote(&self, symbol: &str) -> Result<IndexQuote> {
        let index =
            resolve_index(symbol).ok_or_else(|| anyhow::anyhow!("Unknown symbol: {symbol}"))?;

        let bars = self.history(symbol, "5d", "1d").await?;
        quote_from_bars(index, &bars)
    }

    /// Quotes for every cataloged index. Symbols that fail to fetch are
    /// skipped with a warning rather than failing the whole batch.
    pub async fn all_quotes(&self) -> Vec<IndexQuote> {
        let mut quotes = Vec::with_capacity(INDICES.len());
        for index in INDICES {
            match self.quote(index.name).await {
                Ok(q) => quotes.push(q),
                Err(e) => warn!(symbol = index.name, error = %e, "Skipping index quote"),
            }
        }
        quotes
    }
}

/// Zip the chart arrays into bars, dropping rows with any missing value
fn bars_from_chart(result: ChartResult) -> Vec<Bar> {
    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Vec::new();
    };

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let decimal = |xs: &[Option<f64>]| {
                xs.get(i)
                    .copied()
                    .flatten()
                    .and_then(Decimal::from_f64_retain)
            };
            Some(Bar {
                timestamp: Utc.timestamp_opt(ts, 0).single()?,
                open: decimal(&quote.open)?,
                high: decimal(&quote.high)?,
                low: decimal(&quote.low)?,
                close: decimal(&quote.close)?,
                volume: quote.volume.get(i).copied().flatten()?,
            })
        })
        .collect()
}

/// Build a quote from the last two bars of a daily series
fn quote_from_bars(index: &IndexInfo, bars: &[Bar]) -> Result<IndexQuote> {
    if bars.len() < 2 {
        anyhow::bail!("Not enough recent data for {}", index.name);
    }

    let prev = &bars[bars.len() - 2];
    let last = &bars[bars.len() - 1];

    let change = last.close - prev.close;
    let change_percent = if prev.close != Decimal::ZERO {
        change / prev.close * Decimal::from(100)
    } else {
        Decimal::ZERO
    };

    Ok(IndexQuote {
        symbol: index.name.to_string(),
        price: last.close.round_dp(2),
        change: change.round_dp(2),
        change_percent: change_percent.round_dp(2),
        volume: last.volume,
        high: last.high.round_dp(2),
        low: last.low.round_dp(2),
        open: last.open.round_dp(2),
        exchange: index.exchange,
    })
}
