use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("refresh_cycles_total").absolute(0);
    counter!("price_fetch_errors_total").absolute(0);
    counter!("positions_created_total").absolute(0);
    counter!("positions_deleted_total").absolute(0);
    counter!("positions_imported_total").absolute(0);

    gauge!("tracked_positions").set(0.0);

    handle
}
