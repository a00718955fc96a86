use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;

use async_trait::async_trait;
use rust_decimal::Decimal;

use calltrack::config::AppConfig;
use calltrack::pricing::{PriceFetcher, PriceProvider, SymbolSearch};
use calltrack::services::Refresher;
use calltrack::store::{JsonFileBackend, PositionStore};
use calltrack::AppState;

/// Deterministic provider for tests: quotes from a fixed book, misses for
/// anything else.
pub struct PriceBook(HashMap<String, Decimal>);

#[async_trait]
impl PriceProvider for PriceBook {
    fn name(&self) -> &'static str {
        "test-book"
    }

    async fn fetch(&self, ticker: &str) -> anyhow::Result<Option<Decimal>> {
        Ok(self.0.get(ticker).copied())
    }
}

/// The global metrics recorder can only be installed once per process, so
/// every test shares one handle.
pub fn metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE.get_or_init(calltrack::metrics::init_metrics).clone()
}

pub fn test_config(data_dir: &std::path::Path) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        data_dir: data_dir.to_path_buf(),
        finnhub_api_key: None,
        refresh_enabled: false,
        refresh_interval_secs: 300,
    }
}

/// Build a router backed by a temp-dir store and a scripted price book.
/// The TempDir must stay alive for the duration of the test.
#[allow(dead_code)]
pub fn build_test_app(
    prices: &[(&str, Decimal)],
) -> (axum::Router, Arc<PositionStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");

    let backend = Arc::new(JsonFileBackend::new(dir.path()));
    let store = Arc::new(PositionStore::new(backend));

    let book = prices
        .iter()
        .map(|(t, p)| (t.to_string(), *p))
        .collect::<HashMap<_, _>>();
    let fetcher = Arc::new(PriceFetcher::with_providers(
        vec![Box::new(PriceBook(book))],
        Duration::from_secs(25),
    ));

    let search = Arc::new(SymbolSearch::new(reqwest::Client::new(), None));
    let refresher = Arc::new(Refresher::new(store.clone(), fetcher.clone()));

    let state = AppState {
        store: store.clone(),
        fetcher,
        search,
        refresher,
        config: test_config(dir.path()),
        metrics_handle: metrics_handle(),
    };

    (calltrack::api::router::create_router(state), store, dir)
}
