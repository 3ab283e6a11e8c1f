// =============================================================================
// Green City Backend - Database Seeder
// =============================================================================
// Seeds the sample monitoring points, a week of history per location, and
// the admin account. Points and history are replaced on every run; the
// admin user is only created if absent.
// =============================================================================

use chrono::{Duration, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greencity_backend::auth::hash_password;
use greencity_backend::config::Config;
use greencity_backend::db::{AirQualityPoint, Database, Role};

fn sample_points() -> Vec<AirQualityPoint> {
    vec![
        AirQualityPoint {
            location_id: "JAL001".into(),
            name: "Model Town".into(),
            latitude: 31.3115,
            longitude: 75.5760,
            aqi: 155,
            traffic_density: 0.85,
            green_cover_index: Some(0.30),
        },
        AirQualityPoint {
            location_id: "JAL002".into(),
            name: "Rama Mandi".into(),
            latitude: 31.2850,
            longitude: 75.6100,
            aqi: 180,
            traffic_density: 0.95,
            green_cover_index: Some(0.15),
        },
        AirQualityPoint {
            location_id: "JAL003".into(),
            name: "Urban Estate Phase 2".into(),
            latitude: 31.3390,
            longitude: 75.5450,
            aqi: 120,
            traffic_density: 0.30,
            green_cover_index: Some(0.43),
        },
        AirQualityPoint {
            location_id: "JAL004".into(),
            name: "Jalandhar Cantt".into(),
            latitude: 31.2800,
            longitude: 75.5900,
            aqi: 95,
            traffic_density: 0.55,
            green_cover_index: Some(0.55),
        },
    ]
}

/// Baseline AQI per location for generating the 7-day history window.
fn base_aqi(location_id: &str) -> i64 {
    match location_id {
        "JAL001" => 150,
        "JAL002" => 180,
        "JAL003" => 120,
        _ => 90,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    // Monitoring points
    tracing::info!("Seeding air quality points");
    for point in sample_points() {
        db.upsert_point(&point).await?;
    }

    // A week of readings per location, oldest first
    tracing::info!("Seeding air quality history");
    db.clear_history().await?;
    let today = Utc::now();
    for point in sample_points() {
        for i in 0..7 {
            let timestamp = today - Duration::days(i);
            let aqi = base_aqi(&point.location_id) + (i * 5 - 15);
            db.insert_history(&point.location_id, &timestamp, aqi).await?;
        }
    }

    // Admin account
    let admin_username =
        std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin@123".into());
    let admin_password = std::env::var("ADMIN_PASSWORD")
        .map_err(|_| "ADMIN_PASSWORD must be set to seed the admin user")?;

    if db.find_user_by_username(&admin_username).await?.is_some() {
        tracing::info!("Admin user '{}' already exists, skipping", admin_username);
    } else {
        let id = uuid::Uuid::new_v4().to_string();
        let password_hash = hash_password(&admin_password);
        db.create_user(&id, &admin_username, &password_hash, Role::Admin)
            .await?;
        tracing::info!("Admin user '{}' created", admin_username);
    }

    tracing::info!("Database seeded successfully");
    Ok(())
}
