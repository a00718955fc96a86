use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::AppState;

use super::positions::ApiResponse;

#[derive(Deserialize)]
pub struct QuoteParams {
    pub symbol: Option<String>,
    /// `fresh=true` clears the ticker's cache entry before fetching.
    #[serde(default)]
    pub fresh: bool,
}

#[derive(Serialize)]
pub struct QuotePayload {
    pub symbol: String,
    pub current_price: Decimal,
    pub source: String,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/quote?symbol=AAPL&fresh=true
pub async fn quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<ApiResponse<QuotePayload>>, AppError> {
    let symbol = params
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("symbol parameter is required".into()))?
        .to_uppercase();

    if params.fresh {
        state.fetcher.clear_cached_ticker(&symbol);
    }

    let quote = state
        .fetcher
        .get_price(&symbol)
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    Ok(ApiResponse::ok(QuotePayload {
        symbol: quote.symbol,
        current_price: quote.price,
        source: quote.source,
        cached: quote.cached,
        timestamp: Utc::now(),
    }))
}
