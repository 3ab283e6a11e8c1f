// =============================================================================
// Green City Backend - Library Root
// =============================================================================
// Table of Contents:
// 1. Modules
// 2. Application State
// 3. Router Setup
// =============================================================================

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod geo;
pub mod model;
pub mod points;
pub mod simulate;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::model::ImpactPredictor;

// -----------------------------------------------------------------------------
// 2. Application State
// -----------------------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub predictor: Arc<dyn ImpactPredictor>,
}

// -----------------------------------------------------------------------------
// 3. Router Setup
// -----------------------------------------------------------------------------

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check / diagnostics
        .route("/_health", get(points::health))
        .route("/api/test", get(points::test_route))
        // Auth routes
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        // Air quality data
        .route("/api/data/points", get(points::get_points))
        .route("/api/data/air_quality/:location_id", get(points::get_history))
        // Park simulation
        .route("/api/simulate/park", post(simulate::simulate_park))
        // Citizen feedback
        .route("/api/feedback/submit", post(feedback::submit_feedback))
        .route("/api/admin/reports", get(feedback::get_reports))
        .route("/api/admin/reports/:report_id/resolve", put(feedback::resolve_report))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
