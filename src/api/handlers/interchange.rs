use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use metrics::counter;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::AppError;
use crate::interchange::{read_import_csv, write_export_csv};
use crate::store::ImportReport;
use crate::AppState;

use super::positions::ApiResponse;

#[derive(Deserialize)]
pub struct ImportParams {
    /// Replace the stored collection instead of appending.
    #[serde(default)]
    pub clear: bool,
}

/// POST /api/positions/import?clear=true — CSV body, fixed column order.
/// Each accepted row gets a fresh market price; on a miss the row keeps its
/// own recorded price, or the callout price if none was recorded.
pub async fn import(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: String,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    let mut records =
        read_import_csv(&body).map_err(|e| AppError::BadRequest(format!("invalid CSV: {e}")))?;
    if records.is_empty() {
        return Err(AppError::BadRequest("no rows to import".into()));
    }

    for record in &mut records {
        if record.ticker.is_empty() || record.callout_price <= Decimal::ZERO {
            continue; // the store counts these as errors
        }
        match state.fetcher.get_price(&record.ticker).await {
            Ok(quote) => record.current_price = quote.price,
            Err(e) => {
                tracing::warn!(ticker = %record.ticker, error = %e, "import price fetch failed, keeping recorded price");
                if record.current_price.is_zero() {
                    record.current_price = record.callout_price;
                }
            }
        }
    }

    let report = state.store.import_many(records, params.clear).await?;
    counter!("positions_imported_total").increment(report.imported as u64);
    Ok(ApiResponse::ok(report))
}

/// GET /api/positions/export — CSV projection of the whole collection.
pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let positions = state.store.export_all().await?;
    let csv = write_export_csv(&positions)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"positions.csv\"",
            ),
        ],
        csv,
    ))
}
