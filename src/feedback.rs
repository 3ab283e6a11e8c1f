// =============================================================================
// Green City Backend - Citizen Feedback Routes
// =============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{AdminUser, AuthUser};
use crate::db::{FeedbackReport, FeedbackStatus};
use crate::error::AppError;
use crate::AppState;

// -----------------------------------------------------------------------------
// Request/Response Types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SubmitFeedbackRequest {
    #[serde(rename = "issueType")]
    pub issue_type: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// GeoJSON point, longitude first.
#[derive(Debug, Serialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point",
            coordinates: [longitude, latitude],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub id: String,
    pub issue_type: String,
    pub description: String,
    pub location: GeoPoint,
    pub status: FeedbackStatus,
    pub submitted_at: DateTime<Utc>,
}

impl From<FeedbackReport> for FeedbackResponse {
    fn from(report: FeedbackReport) -> Self {
        Self {
            id: report.id,
            issue_type: report.issue_type,
            description: report.description,
            location: GeoPoint::new(report.longitude, report.latitude),
            status: report.status,
            submitted_at: report.submitted_at,
        }
    }
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// Submit a feedback report. Public, no auth.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (issue_type, description, latitude, longitude) = match (
        req.issue_type.filter(|s| !s.is_empty()),
        req.description.filter(|s| !s.is_empty()),
        req.latitude,
        req.longitude,
    ) {
        (Some(i), Some(d), Some(lat), Some(lon)) => (i, d, lat, lon),
        _ => return Err(AppError::Validation("Missing required fields".into())),
    };

    let id = state
        .db
        .insert_feedback(&issue_type, &description, latitude, longitude)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Feedback submitted successfully!",
            "id": id,
        })),
    ))
}

/// List all feedback reports, newest first. Any authenticated user.
pub async fn get_reports(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<FeedbackResponse>>, AppError> {
    let reports = state.db.all_reports().await?;
    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

/// Mark a report resolved. Admin only.
pub async fn resolve_report(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.db.resolve_report(&report_id).await? {
        return Err(AppError::NotFound("Report not found".into()));
    }

    Ok(Json(json!({
        "message": "Report status updated to resolved",
    })))
}
