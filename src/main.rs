use std::sync::Arc;

use calltrack::api::router::create_router;
use calltrack::config::AppConfig;
use calltrack::pricing::{PriceFetcher, SymbolSearch};
use calltrack::services::{spawn_refresh_scheduler, Refresher};
use calltrack::store::{JsonFileBackend, PositionStore};
use calltrack::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let metrics_handle = calltrack::metrics::init_metrics();

    let backend = Arc::new(JsonFileBackend::new(&config.data_dir));
    let store = Arc::new(PositionStore::new(backend));
    tracing::info!(data_dir = %config.data_dir.display(), "position store ready");

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let fetcher = Arc::new(PriceFetcher::new(http.clone()));
    let search = Arc::new(SymbolSearch::new(http, config.finnhub_api_key.clone()));
    let refresher = Arc::new(Refresher::new(store.clone(), fetcher.clone()));

    if config.refresh_enabled {
        // Detached for the life of the process; aborting the handle is the
        // stop path if one is ever needed.
        let _scheduler = spawn_refresh_scheduler(
            refresher.clone(),
            store.clone(),
            config.refresh_interval_secs,
        );
        tracing::info!(
            interval_secs = config.refresh_interval_secs,
            "refresh scheduler started"
        );
    } else {
        tracing::info!("periodic refresh disabled (REFRESH_ENABLED=false)");
    }

    let state = AppState {
        store,
        fetcher,
        search,
        refresher,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
