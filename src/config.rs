// =============================================================================
// Green City Backend - Configuration
// =============================================================================

use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1:5000")
    pub bind_address: String,

    /// Database URL (SQLite path)
    pub database_url: String,

    /// JWT secret for signing tokens
    pub jwt_secret: String,

    /// JWT token expiry in hours
    pub jwt_expiry_hours: i64,

    /// Path to the trained AQI regression artifact
    pub model_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required; startup fails without
    /// them. Everything else has a sensible default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:5000".into()),
            database_url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".into())
                .parse()
                .unwrap_or(24),
            model_path: env::var("MODEL_PATH").unwrap_or_else(|_| "model/aqi_model.json".into()),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
