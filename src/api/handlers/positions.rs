use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewPosition, Position, PositionUpdate};
use crate::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreatePositionRequest {
    pub ticker: String,
    pub date: Option<NaiveDate>,
    pub callout_price: Decimal,
    pub target1: Option<Decimal>,
    pub target2: Option<Decimal>,
    pub target3: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub buy_zone_low: Option<Decimal>,
    pub buy_zone_high: Option<Decimal>,
}

#[derive(Deserialize, Default)]
pub struct UpdatePositionRequest {
    pub ticker: Option<String>,
    pub date: Option<NaiveDate>,
    pub callout_price: Option<Decimal>,
    pub target1: Option<Decimal>,
    pub target2: Option<Decimal>,
    pub target3: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub buy_zone_low: Option<Decimal>,
    pub buy_zone_high: Option<Decimal>,
}

impl From<UpdatePositionRequest> for PositionUpdate {
    fn from(req: UpdatePositionRequest) -> Self {
        // A price level sent as 0 clears it (falsy rule); absent fields stay
        // untouched.
        PositionUpdate {
            ticker: req.ticker,
            date: req.date.map(Some),
            callout_price: req.callout_price,
            target1: req.target1.map(Some),
            target2: req.target2.map(Some),
            target3: req.target3.map(Some),
            stop_loss: req.stop_loss.map(Some),
            buy_zone_low: req.buy_zone_low.map(Some),
            buy_zone_high: req.buy_zone_high.map(Some),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/positions — all tracked callouts.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Position>>>, AppError> {
    let positions = state.store.list().await?;
    Ok(ApiResponse::ok(positions))
}

/// POST /api/positions — create a callout. The initial market price comes
/// from the aggregator, falling back to the callout price when every source
/// misses.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreatePositionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Position>>), AppError> {
    if body.ticker.trim().is_empty() {
        return Err(AppError::BadRequest("ticker is required".into()));
    }
    if body.callout_price <= Decimal::ZERO {
        return Err(AppError::BadRequest("callout price must be positive".into()));
    }

    let current_price = match state.fetcher.get_price(&body.ticker).await {
        Ok(quote) => quote.price,
        Err(e) => {
            tracing::warn!(ticker = %body.ticker, error = %e, "initial price fetch failed, using callout price");
            body.callout_price
        }
    };

    let position = state
        .store
        .add(NewPosition {
            ticker: body.ticker,
            date: body.date,
            callout_price: body.callout_price,
            target1: body.target1,
            target2: body.target2,
            target3: body.target3,
            stop_loss: body.stop_loss,
            buy_zone_low: body.buy_zone_low,
            buy_zone_high: body.buy_zone_high,
            current_price,
        })
        .await?;

    counter!("positions_created_total").increment(1);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data: Some(position),
            error: None,
        }),
    ))
}

/// PUT /api/positions/{id} — partial update. Changing the callout price
/// resets the hit history (the store re-runs the engine).
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePositionRequest>,
) -> Result<Json<ApiResponse<Position>>, AppError> {
    let update: PositionUpdate = body.into();
    if update.is_empty() {
        return Err(AppError::BadRequest(
            "at least one field must be provided for update".into(),
        ));
    }

    let updated = state
        .store
        .update(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("position not found".into()))?;

    Ok(ApiResponse::ok(updated))
}

/// DELETE /api/positions/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !state.store.delete(id).await? {
        return Err(AppError::NotFound("position not found".into()));
    }
    counter!("positions_deleted_total").increment(1);
    Ok(ApiResponse::ok(()))
}

/// POST /api/positions/clear — drop the whole collection.
pub async fn clear(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.store.clear().await?;
    tracing::info!("all positions cleared");
    Ok(ApiResponse::ok(()))
}
