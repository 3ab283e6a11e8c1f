// =============================================================================
// Green City Backend - Database Layer
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

// -----------------------------------------------------------------------------
// Models
// -----------------------------------------------------------------------------

/// User role. `admin` is only created by seeding, never by registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Civilian,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Civilian => "civilian",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Parse a role string from a registration request. Only the two
    /// self-service roles are accepted here.
    pub fn parse_registerable(s: &str) -> Option<Role> {
        match s {
            "civilian" => Some(Role::Civilian),
            "teacher" => Some(Role::Teacher),
            _ => None,
        }
    }
}

/// User model.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Air quality monitoring point.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AirQualityPoint {
    pub location_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: i64,
    pub traffic_density: f64,
    /// Absent for points seeded before the green-cover survey; the
    /// simulation engine substitutes a default.
    pub green_cover_index: Option<f64>,
}

/// Historical AQI reading for a monitoring point. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryRecord {
    pub location_id: String,
    pub timestamp: DateTime<Utc>,
    pub aqi: i64,
}

/// Feedback report status. Transitions one way: pending -> resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Resolved,
}

/// Citizen feedback report.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedbackReport {
    pub id: String,
    pub issue_type: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: FeedbackStatus,
    pub submitted_at: DateTime<Utc>,
}

// -----------------------------------------------------------------------------
// Database
// -----------------------------------------------------------------------------

impl Database {
    /// Create a new database connection pool.
    pub async fn new(url: &str) -> Result<Self, sqlx::Error> {
        // Add create_if_missing option for SQLite
        let url_with_options = if url.starts_with("sqlite:") && !url.contains("?") {
            format!("{}?mode=rwc", url)
        } else if url.starts_with("sqlite:") && !url.contains("mode=") {
            format!("{}&mode=rwc", url)
        } else {
            url.to_string()
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url_with_options)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        // Users table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Air quality points table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS air_quality_points (
                location_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                aqi INTEGER NOT NULL,
                traffic_density REAL NOT NULL DEFAULT 0.0,
                green_cover_index REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Air quality history table (append-only)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS air_quality_history (
                id TEXT PRIMARY KEY,
                location_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                aqi INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Feedback reports table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feedback_reports (
                id TEXT PRIMARY KEY,
                issue_type TEXT NOT NULL,
                description TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                submitted_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes for the hot lookups
        let _ = sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_location ON air_quality_history(location_id, timestamp)",
        )
        .execute(&self.pool)
        .await;
        let _ = sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_feedback_submitted ON feedback_reports(submitted_at)",
        )
        .execute(&self.pool)
        .await;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    // =========================================================================
    // User Methods
    // =========================================================================

    /// Find user by ID.
    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find user by username.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    /// Create a new user.
    pub async fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .execute(&self.pool)
        .await?;

        self.find_user_by_id(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    // =========================================================================
    // Air Quality Methods
    // =========================================================================

    /// Get all monitoring points.
    pub async fn all_points(&self) -> Result<Vec<AirQualityPoint>, sqlx::Error> {
        sqlx::query_as::<_, AirQualityPoint>(
            "SELECT * FROM air_quality_points ORDER BY location_id",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Count monitoring points (diagnostic route).
    pub async fn count_points(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM air_quality_points")
            .fetch_one(&self.pool)
            .await
    }

    /// Insert or replace a monitoring point (seeding).
    pub async fn upsert_point(&self, point: &AirQualityPoint) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO air_quality_points (location_id, name, latitude, longitude, aqi, traffic_density, green_cover_index)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(location_id) DO UPDATE SET
                name = excluded.name,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                aqi = excluded.aqi,
                traffic_density = excluded.traffic_density,
                green_cover_index = excluded.green_cover_index
            "#,
        )
        .bind(&point.location_id)
        .bind(&point.name)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(point.aqi)
        .bind(point.traffic_density)
        .bind(point.green_cover_index)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get history for a location, oldest reading first.
    pub async fn history_for_location(
        &self,
        location_id: &str,
    ) -> Result<Vec<HistoryRecord>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT location_id, timestamp, aqi FROM air_quality_history
            WHERE location_id = ?
            ORDER BY timestamp ASC
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Append a history reading (seeding/ingestion).
    pub async fn insert_history(
        &self,
        location_id: &str,
        timestamp: &DateTime<Utc>,
        aqi: i64,
    ) -> Result<(), sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO air_quality_history (id, location_id, timestamp, aqi)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(location_id)
        .bind(timestamp.to_rfc3339())
        .bind(aqi)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Clear history (used by the seeder before re-inserting).
    pub async fn clear_history(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM air_quality_history")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Feedback Methods
    // =========================================================================

    /// Insert a new feedback report as pending. Returns the generated ID.
    pub async fn insert_feedback(
        &self,
        issue_type: &str,
        description: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<String, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO feedback_reports (id, issue_type, description, latitude, longitude, status, submitted_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(&id)
        .bind(issue_type)
        .bind(description)
        .bind(latitude)
        .bind(longitude)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Get all feedback reports, newest first.
    pub async fn all_reports(&self) -> Result<Vec<FeedbackReport>, sqlx::Error> {
        sqlx::query_as::<_, FeedbackReport>(
            "SELECT * FROM feedback_reports ORDER BY submitted_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Find a feedback report by ID.
    pub async fn find_report_by_id(&self, id: &str) -> Result<Option<FeedbackReport>, sqlx::Error> {
        sqlx::query_as::<_, FeedbackReport>("SELECT * FROM feedback_reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Mark a report resolved. Returns false when no report matched.
    pub async fn resolve_report(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE feedback_reports SET status = 'resolved' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
