use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tracked_positions: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let tracked = state.store.list().await.map(|p| p.len()).unwrap_or(0);
    let last_updated = state.store.last_updated().await.unwrap_or(None);

    Json(HealthResponse {
        status: "healthy",
        tracked_positions: tracked,
        last_updated,
    })
}
