//! Individual quote providers. Each one is best-effort: network failures,
//! non-2xx responses, and unparseable payloads all come back as "no data"
//! so the fetcher can move on to the next source.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

const YAHOO_CHART_BASE: &str = "https://query1.finance.yahoo.com";
const YAHOO_QUOTE_BASE: &str = "https://query2.finance.yahoo.com";
const STOOQ_BASE: &str = "https://stooq.com";

// Browser-ish UA; some quote endpoints reject default client UAs.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Sanity bound on quotes; anything outside is treated as a miss.
pub fn plausible(price: Decimal) -> bool {
    price > Decimal::ZERO && price < Decimal::from(100_000)
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "no data from this source", not an error.
    async fn fetch(&self, ticker: &str) -> anyhow::Result<Option<Decimal>>;
}

fn decimal_from(value: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(value).filter(|p| plausible(*p))
}

// ---------------------------------------------------------------------------
// Yahoo Finance chart API
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    regular_market_price: Option<f64>,
}

#[derive(Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

pub struct YahooChartProvider {
    http: Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: YAHOO_CHART_BASE.into(),
        }
    }
}

#[async_trait]
impl PriceProvider for YahooChartProvider {
    fn name(&self) -> &'static str {
        "yahoo-chart"
    }

    async fn fetch(&self, ticker: &str) -> anyhow::Result<Option<Decimal>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let resp = self
            .http
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let body: ChartResponse = resp.json().await?;
        let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(None);
        };

        if let Some(price) = result.meta.regular_market_price.and_then(decimal_from) {
            return Ok(Some(price));
        }

        // Fall back to the latest close bar.
        let close = result
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .and_then(|q| q.close.into_iter().flatten().next())
            .and_then(decimal_from);
        Ok(close)
    }
}

// ---------------------------------------------------------------------------
// Yahoo Finance quote API
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    quote_response: QuoteEnvelope,
}

#[derive(Deserialize)]
struct QuoteEnvelope {
    #[serde(default)]
    result: Vec<QuoteResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    #[serde(default)]
    regular_market_price: Option<f64>,
}

pub struct YahooQuoteProvider {
    http: Client,
    base_url: String,
}

impl YahooQuoteProvider {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: YAHOO_QUOTE_BASE.into(),
        }
    }
}

#[async_trait]
impl PriceProvider for YahooQuoteProvider {
    fn name(&self) -> &'static str {
        "yahoo-quote"
    }

    async fn fetch(&self, ticker: &str) -> anyhow::Result<Option<Decimal>> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("symbols", ticker)])
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let body: QuoteResponse = resp.json().await?;
        let price = body
            .quote_response
            .result
            .into_iter()
            .next()
            .and_then(|r| r.regular_market_price)
            .and_then(decimal_from);
        Ok(price)
    }
}

// ---------------------------------------------------------------------------
// Stooq CSV endpoint
// ---------------------------------------------------------------------------

pub struct StooqProvider {
    http: Client,
    base_url: String,
}

impl StooqProvider {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: STOOQ_BASE.into(),
        }
    }
}

#[async_trait]
impl PriceProvider for StooqProvider {
    fn name(&self) -> &'static str {
        "stooq"
    }

    async fn fetch(&self, ticker: &str) -> anyhow::Result<Option<Decimal>> {
        // Stooq lists US symbols with a ".us" suffix; payload is a two-line
        // CSV: header then symbol,date,time,open,high,low,close,volume.
        let symbol = format!("{}.us", ticker.to_lowercase());
        let url = format!("{}/q/l/", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("s", symbol.as_str()), ("f", "sd2t2ohlcv"), ("h", ""), ("e", "csv")])
            .send()
            .await?
            .error_for_status()?;

        let body = resp.text().await?;
        Ok(parse_stooq_close(&body))
    }
}

fn parse_stooq_close(csv: &str) -> Option<Decimal> {
    let row = csv.lines().nth(1)?;
    let close = row.split(',').nth(6)?.trim();
    close.parse::<Decimal>().ok().filter(|p| plausible(*p))
}
