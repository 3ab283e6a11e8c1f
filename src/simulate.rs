// =============================================================================
// Green City Backend - Park Impact Simulation
// =============================================================================

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::db::AirQualityPoint;
use crate::error::AppError;
use crate::geo::haversine;
use crate::model::ImpactPredictor;
use crate::AppState;

/// Points within this many kilometers of the proposed park are re-predicted.
pub const IMPACT_RADIUS_KM: f64 = 5.0;

/// Green cover fallback for points seeded without an index.
pub const DEFAULT_GREEN_COVER: f64 = 0.3;

// -----------------------------------------------------------------------------
// Request/Response Types
// -----------------------------------------------------------------------------

/// Coordinates of the proposed park. Fields are `Option` so that an absent
/// field is distinguishable from a literal 0.0 coordinate, which is valid.
#[derive(Debug, Deserialize)]
pub struct SimulateParkRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A monitoring point with its simulated AQI. The pre-simulation value is
/// always carried in `original_aqi`, whether or not the point was affected.
#[derive(Debug, Clone, Serialize)]
pub struct SimulatedPoint {
    pub location_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: i64,
    pub traffic_density: f64,
    pub green_cover_index: Option<f64>,
    pub original_aqi: i64,
    pub simulated: bool,
}

// -----------------------------------------------------------------------------
// Simulation Engine
// -----------------------------------------------------------------------------

/// Run the park what-if simulation over every known point.
///
/// Points within [`IMPACT_RADIUS_KM`] of the proposed location get a new AQI
/// from the predictor (truncated to an integer, matching the offline
/// pipeline); everything else passes through unchanged. Output order follows
/// input order. Nothing is persisted.
pub fn run_simulation(
    park_lat: f64,
    park_lon: f64,
    points: Vec<AirQualityPoint>,
    predictor: &dyn ImpactPredictor,
) -> Vec<SimulatedPoint> {
    points
        .into_iter()
        .map(|point| {
            let distance = haversine(park_lat, park_lon, point.latitude, point.longitude);
            let original_aqi = point.aqi;

            let (aqi, simulated) = if distance <= IMPACT_RADIUS_KM {
                let green_cover = point.green_cover_index.unwrap_or(DEFAULT_GREEN_COVER);
                let predicted = predictor.predict(original_aqi as f64, distance, green_cover);
                (predicted as i64, true)
            } else {
                (original_aqi, false)
            };

            SimulatedPoint {
                location_id: point.location_id,
                name: point.name,
                latitude: point.latitude,
                longitude: point.longitude,
                aqi,
                traffic_density: point.traffic_density,
                green_cover_index: point.green_cover_index,
                original_aqi,
                simulated,
            }
        })
        .collect()
}

// -----------------------------------------------------------------------------
// Handler
// -----------------------------------------------------------------------------

/// Simulate adding a park at the given coordinates.
pub async fn simulate_park(
    State(state): State<AppState>,
    Json(req): Json<SimulateParkRequest>,
) -> Result<Json<Vec<SimulatedPoint>>, AppError> {
    let (Some(latitude), Some(longitude)) = (req.latitude, req.longitude) else {
        return Err(AppError::Validation("Missing coordinates".into()));
    };

    let points = state.db.all_points().await?;
    let simulated = run_simulation(latitude, longitude, points, state.predictor.as_ref());

    Ok(Json(simulated))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predictor that always knocks a fixed amount off the original AQI.
    struct StubPredictor;

    impl ImpactPredictor for StubPredictor {
        fn predict(&self, original_aqi: f64, _distance_km: f64, _green_cover: f64) -> f64 {
            original_aqi - 25.0
        }
    }

    fn point(location_id: &str, latitude: f64, longitude: f64, aqi: i64) -> AirQualityPoint {
        AirQualityPoint {
            location_id: location_id.to_string(),
            name: location_id.to_string(),
            latitude,
            longitude,
            aqi,
            traffic_density: 0.5,
            green_cover_index: Some(0.3),
        }
    }

    #[test]
    fn test_point_inside_radius_is_simulated() {
        let points = vec![point("A", 31.3115, 75.5760, 155)];
        let result = run_simulation(31.3115, 75.5760, points, &StubPredictor);

        assert_eq!(result.len(), 1);
        assert!(result[0].simulated);
        assert_eq!(result[0].aqi, 130);
        assert_eq!(result[0].original_aqi, 155);
    }

    #[test]
    fn test_point_outside_radius_passes_through() {
        // ~50 km north of the park
        let points = vec![point("B", 31.76, 75.5760, 180)];
        let result = run_simulation(31.3115, 75.5760, points, &StubPredictor);

        assert!(!result[0].simulated);
        assert_eq!(result[0].aqi, 180);
        assert_eq!(result[0].original_aqi, 180);
    }

    #[test]
    fn test_mixed_points_keep_order_and_count() {
        let points = vec![
            point("NEAR", 31.3115, 75.5760, 155),
            point("FAR", 31.76, 75.5760, 180),
            point("NEAR2", 31.3120, 75.5765, 120),
        ];
        let result = run_simulation(31.3115, 75.5760, points, &StubPredictor);

        assert_eq!(result.len(), 3);
        let ids: Vec<&str> = result.iter().map(|p| p.location_id.as_str()).collect();
        assert_eq!(ids, vec!["NEAR", "FAR", "NEAR2"]);
        assert!(result[0].simulated);
        assert!(!result[1].simulated);
        assert!(result[2].simulated);
    }

    #[test]
    fn test_missing_green_cover_uses_default() {
        struct CaptureGreen(std::sync::Mutex<Vec<f64>>);
        impl ImpactPredictor for CaptureGreen {
            fn predict(&self, original_aqi: f64, _d: f64, green_cover: f64) -> f64 {
                self.0.lock().unwrap().push(green_cover);
                original_aqi
            }
        }

        let mut p = point("A", 31.3115, 75.5760, 155);
        p.green_cover_index = None;

        let capture = CaptureGreen(std::sync::Mutex::new(Vec::new()));
        run_simulation(31.3115, 75.5760, vec![p], &capture);

        assert_eq!(*capture.0.lock().unwrap(), vec![DEFAULT_GREEN_COVER]);
    }

    #[test]
    fn test_prediction_is_truncated() {
        struct Fractional;
        impl ImpactPredictor for Fractional {
            fn predict(&self, _o: f64, _d: f64, _g: f64) -> f64 {
                129.9
            }
        }

        let points = vec![point("A", 31.3115, 75.5760, 155)];
        let result = run_simulation(31.3115, 75.5760, points, &Fractional);
        assert_eq!(result[0].aqi, 129);
    }
}
