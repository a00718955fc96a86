use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::services::{CycleOutcome, RefreshReport};
use crate::AppState;

use super::positions::ApiResponse;

/// POST /api/refresh — run one full refresh cycle.
pub async fn run(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RefreshReport>>, AppError> {
    match state.refresher.run_cycle().await? {
        CycleOutcome::Completed(report) => Ok(ApiResponse::ok(report)),
        CycleOutcome::AlreadyRunning => Ok(Json(ApiResponse {
            success: false,
            data: None,
            error: Some("refresh cycle already in progress".into()),
        })),
    }
}
