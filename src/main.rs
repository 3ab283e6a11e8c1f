// =============================================================================
// Green City Backend - API Server Entry Point
// =============================================================================
// Table of Contents:
// 1. Imports
// 2. Main Entry Point
// =============================================================================

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greencity_backend::config::Config;
use greencity_backend::db::Database;
use greencity_backend::model::LinearModel;
use greencity_backend::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    let _ = dotenvy::dotenv();

    // Load configuration; missing DATABASE_URL or JWT_SECRET aborts here
    let config = Config::from_env()?;
    let bind_addr = config.bind_address.clone();

    // Ensure database directory exists for SQLite
    if config.database_url.starts_with("sqlite:") {
        let db_path = config.database_url.trim_start_matches("sqlite:");
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
    }

    // Initialize database
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    // Load the regression artifact; a missing or malformed model is fatal
    let model = LinearModel::load(&config.model_path)?;
    tracing::info!("AQI simulation model loaded from {}", config.model_path);

    // Create app state
    let state = AppState {
        config: Arc::new(config),
        db,
        predictor: Arc::new(model),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Green City API server running on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
