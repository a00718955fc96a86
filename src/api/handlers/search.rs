use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::pricing::SymbolMatch;
use crate::AppState;

use super::positions::ApiResponse;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// GET /api/search?q=apple — symbol lookup with static fallback.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<SymbolMatch>>>, AppError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("query parameter is required".into()))?;

    let results = state.search.search(query).await;
    Ok(ApiResponse::ok(results))
}
