use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Positions
        .route(
            "/api/positions",
            get(handlers::positions::list).post(handlers::positions::create),
        )
        .route(
            "/api/positions/:id",
            put(handlers::positions::update).delete(handlers::positions::delete),
        )
        .route("/api/positions/clear", post(handlers::positions::clear))
        // Refresh
        .route("/api/refresh", post(handlers::refresh::run))
        // Bulk interchange
        .route("/api/positions/import", post(handlers::interchange::import))
        .route("/api/positions/export", get(handlers::interchange::export))
        // Quotes and symbol lookup
        .route("/api/quote", get(handlers::quotes::quote))
        .route("/api/search", get(handlers::search::search));

    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
