//! Monthly summary handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{AppError, AppState};
use pocket_core::store::keys;
use pocket_core::{BlobStoreExt, MonthKey, MonthlySummary};

/// GET /api/summaries/:month - Get the savings summary for a `YYYY-MM` month
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
) -> Result<Json<MonthlySummary>, AppError> {
    let month: MonthKey = month
        .parse()
        .map_err(|_| AppError::bad_request("Month must be formatted as YYYY-MM"))?;

    let summary = state
        .store
        .get_json::<MonthlySummary>(&keys::summary(month))?
        .ok_or_else(|| AppError::not_found(&format!("No summary for {}", month)))?;

    Ok(Json(summary))
}
