//! Short-lived per-ticker quote cache, owned by the fetcher and injected
//! where needed rather than living in a global.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;

pub const DEFAULT_TTL: Duration = Duration::from_secs(25);

#[derive(Debug, Clone)]
pub struct CachedQuote {
    pub price: Decimal,
    pub source: String,
    pub fetched_at: Instant,
}

/// Plain map guarded by a mutex. A stale or duplicate fetch is harmless
/// (idempotent overwrite), so no finer-grained locking is needed.
pub struct PriceCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedQuote>>,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh entry for `ticker`, if one exists within the TTL window.
    pub fn get(&self, ticker: &str) -> Option<CachedQuote> {
        let entries = self.entries.lock().expect("price cache poisoned");
        entries
            .get(&ticker.to_uppercase())
            .filter(|q| q.fetched_at.elapsed() < self.ttl)
            .cloned()
    }

    pub fn insert(&self, ticker: &str, price: Decimal, source: &str) {
        let mut entries = self.entries.lock().expect("price cache poisoned");
        entries.insert(
            ticker.to_uppercase(),
            CachedQuote {
                price,
                source: source.to_string(),
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().expect("price cache poisoned").clear();
    }

    pub fn clear_ticker(&self, ticker: &str) {
        self.entries
            .lock()
            .expect("price cache poisoned")
            .remove(&ticker.to_uppercase());
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insert_get_case_insensitive() {
        let cache = PriceCache::default();
        cache.insert("aapl", dec!(150), "test");
        let hit = cache.get("AAPL").unwrap();
        assert_eq!(hit.price, dec!(150));
        assert_eq!(hit.source, "test");
    }

    #[test]
    fn test_expiry() {
        let cache = PriceCache::new(Duration::ZERO);
        cache.insert("AAPL", dec!(150), "test");
        assert!(cache.get("AAPL").is_none());
    }

    #[test]
    fn test_clear_one_and_all() {
        let cache = PriceCache::default();
        cache.insert("AAPL", dec!(150), "test");
        cache.insert("MSFT", dec!(300), "test");

        cache.clear_ticker("aapl");
        assert!(cache.get("AAPL").is_none());
        assert!(cache.get("MSFT").is_some());

        cache.clear();
        assert!(cache.get("MSFT").is_none());
    }
}
