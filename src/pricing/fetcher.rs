//! Multi-source price fetcher: tries providers in priority order, caches the
//! first plausible quote per ticker for a short window.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::cache::{PriceCache, DEFAULT_TTL};
use super::providers::{
    plausible, PriceProvider, StooqProvider, YahooChartProvider, YahooQuoteProvider,
};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no price source available for {0}")]
    NoSource(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub source: String,
    /// True when the quote was served from the cache window.
    pub cached: bool,
}

pub struct PriceFetcher {
    providers: Vec<Box<dyn PriceProvider>>,
    cache: PriceCache,
}

impl PriceFetcher {
    /// Standard provider lineup, in order of reliability.
    pub fn new(http: reqwest::Client) -> Self {
        let providers: Vec<Box<dyn PriceProvider>> = vec![
            Box::new(YahooChartProvider::new(http.clone())),
            Box::new(YahooQuoteProvider::new(http.clone())),
            Box::new(StooqProvider::new(http)),
        ];
        Self::with_providers(providers, DEFAULT_TTL)
    }

    pub fn with_providers(providers: Vec<Box<dyn PriceProvider>>, ttl: Duration) -> Self {
        Self {
            providers,
            cache: PriceCache::new(ttl),
        }
    }

    /// Resolve a quote for `ticker`: cache first, then each provider in
    /// order. One provider failing never aborts the call.
    pub async fn get_price(&self, ticker: &str) -> Result<Quote, FetchError> {
        let ticker = ticker.trim().to_uppercase();

        if let Some(hit) = self.cache.get(&ticker) {
            tracing::debug!(ticker = %ticker, price = %hit.price, source = %hit.source, "price cache hit");
            return Ok(Quote {
                symbol: ticker,
                price: hit.price,
                source: hit.source,
                cached: true,
            });
        }

        for provider in &self.providers {
            match provider.fetch(&ticker).await {
                Ok(Some(price)) if plausible(price) => {
                    tracing::info!(ticker = %ticker, price = %price, source = provider.name(), "price fetched");
                    self.cache.insert(&ticker, price, provider.name());
                    return Ok(Quote {
                        symbol: ticker,
                        price,
                        source: provider.name().to_string(),
                        cached: false,
                    });
                }
                Ok(_) => {
                    tracing::debug!(ticker = %ticker, source = provider.name(), "no data from provider");
                }
                Err(e) => {
                    tracing::debug!(ticker = %ticker, source = provider.name(), error = %e, "provider failed");
                }
            }
        }

        tracing::warn!(ticker = %ticker, "all price sources exhausted");
        Err(FetchError::NoSource(ticker))
    }

    /// Peek at the cache without triggering a fetch.
    pub fn cached_price(&self, ticker: &str) -> Option<Decimal> {
        self.cache.get(ticker).map(|q| q.price)
    }

    /// Name of the source that produced the cached quote, if still fresh.
    pub fn price_source(&self, ticker: &str) -> Option<String> {
        self.cache.get(ticker).map(|q| q.source)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn clear_cached_ticker(&self, ticker: &str) {
        self.cache.clear_ticker(ticker);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Provider returning a fixed outcome, counting calls.
    struct Scripted {
        name: &'static str,
        outcome: Result<Option<Decimal>, String>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn ok(name: &'static str, price: Decimal) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self { name, outcome: Ok(Some(price)), calls: calls.clone() },
                calls,
            )
        }

        fn miss(name: &'static str) -> Self {
            Self { name, outcome: Ok(None), calls: Arc::new(AtomicUsize::new(0)) }
        }

        fn failing(name: &'static str) -> Self {
            Self { name, outcome: Err("boom".into()), calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    #[async_trait]
    impl PriceProvider for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _ticker: &str) -> anyhow::Result<Option<Decimal>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(v) => Ok(*v),
                Err(msg) => Err(anyhow::anyhow!(msg.clone())),
            }
        }
    }

    #[tokio::test]
    async fn test_first_valid_provider_wins() {
        let (good, _) = Scripted::ok("second", dec!(42));
        let fetcher = PriceFetcher::with_providers(
            vec![Box::new(Scripted::failing("first")), Box::new(good)],
            DEFAULT_TTL,
        );
        let quote = fetcher.get_price("aapl").await.unwrap();
        assert_eq!(quote.price, dec!(42));
        assert_eq!(quote.source, "second");
        assert_eq!(quote.symbol, "AAPL");
        assert!(!quote.cached);
    }

    #[tokio::test]
    async fn test_miss_then_fallback() {
        let (good, _) = Scripted::ok("backup", dec!(10));
        let fetcher = PriceFetcher::with_providers(
            vec![Box::new(Scripted::miss("primary")), Box::new(good)],
            DEFAULT_TTL,
        );
        let quote = fetcher.get_price("MSFT").await.unwrap();
        assert_eq!(quote.source, "backup");
    }

    #[tokio::test]
    async fn test_implausible_price_is_a_miss() {
        let (huge, _) = Scripted::ok("bogus", dec!(250000));
        let (good, _) = Scripted::ok("sane", dec!(99));
        let fetcher = PriceFetcher::with_providers(
            vec![Box::new(huge), Box::new(good)],
            DEFAULT_TTL,
        );
        let quote = fetcher.get_price("NVDA").await.unwrap();
        assert_eq!(quote.source, "sane");
    }

    #[tokio::test]
    async fn test_all_sources_exhausted() {
        let fetcher = PriceFetcher::with_providers(
            vec![Box::new(Scripted::failing("a")), Box::new(Scripted::miss("b"))],
            DEFAULT_TTL,
        );
        let err = fetcher.get_price("ZZZZ").await.unwrap_err();
        assert!(matches!(err, FetchError::NoSource(t) if t == "ZZZZ"));
    }

    #[tokio::test]
    async fn test_cache_reused_within_window() {
        let (good, calls) = Scripted::ok("only", dec!(50));
        let fetcher = PriceFetcher::with_providers(vec![Box::new(good)], DEFAULT_TTL);

        let first = fetcher.get_price("AAPL").await.unwrap();
        assert!(!first.cached);
        let second = fetcher.get_price("AAPL").await.unwrap();
        assert!(second.cached);
        assert_eq!(second.price, dec!(50));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(fetcher.cached_price("aapl"), Some(dec!(50)));
        assert_eq!(fetcher.price_source("AAPL").as_deref(), Some("only"));
    }

    #[tokio::test]
    async fn test_clear_ticker_forces_refetch() {
        let (good, calls) = Scripted::ok("only", dec!(50));
        let fetcher = PriceFetcher::with_providers(vec![Box::new(good)], DEFAULT_TTL);

        fetcher.get_price("AAPL").await.unwrap();
        fetcher.clear_cached_ticker("AAPL");
        let quote = fetcher.get_price("AAPL").await.unwrap();
        assert!(!quote.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_caches() {
        let (good, calls) = Scripted::ok("only", dec!(50));
        let fetcher = PriceFetcher::with_providers(vec![Box::new(good)], Duration::ZERO);

        fetcher.get_price("AAPL").await.unwrap();
        fetcher.get_price("AAPL").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fetcher.cached_price("AAPL"), None);
    }
}
