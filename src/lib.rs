pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod interchange;
pub mod metrics;
pub mod models;
pub mod pricing;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::pricing::{PriceFetcher, SymbolSearch};
use crate::services::Refresher;
use crate::store::PositionStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PositionStore>,
    pub fetcher: Arc<PriceFetcher>,
    pub search: Arc<SymbolSearch>,
    pub refresher: Arc<Refresher>,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
