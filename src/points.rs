// =============================================================================
// Green City Backend - Air Quality Data Routes
// =============================================================================

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::db::{AirQualityPoint, HistoryRecord};
use crate::error::AppError;
use crate::AppState;

/// Get all monitoring points.
pub async fn get_points(
    State(state): State<AppState>,
) -> Result<Json<Vec<AirQualityPoint>>, AppError> {
    let points = state.db.all_points().await?;
    Ok(Json(points))
}

/// Get historical AQI readings for one location, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    let records = state.db.history_for_location(&location_id).await?;
    if records.is_empty() {
        return Err(AppError::NotFound("No data found for this location".into()));
    }
    Ok(Json(records))
}

/// Diagnostic route: confirms the database is reachable and reports how many
/// monitoring points are loaded.
pub async fn test_route(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let count = state.db.count_points().await?;
    Ok(Json(json!({
        "message": "Hello from the Green City backend!",
        "db_connection_status": "success",
        "documents_in_collection": count,
    })))
}

/// Liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
