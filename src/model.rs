// =============================================================================
// Green City Backend - AQI Impact Predictor
// =============================================================================
// The regression is trained offline; this module only loads the exported
// artifact and evaluates it. The simulation engine depends on the trait, not
// the artifact, so tests can substitute a stub.
// =============================================================================

use std::path::Path;

use serde::Deserialize;

/// Predicts a new AQI value from the 3-feature vector the offline training
/// used: (original AQI, distance from the proposed park in km, existing
/// green cover index).
pub trait ImpactPredictor: Send + Sync {
    fn predict(&self, original_aqi: f64, distance_km: f64, green_cover: f64) -> f64;
}

/// Linear regression artifact exported by the offline training run.
///
/// Coefficient order matches the training feature order:
/// `[original_aqi, distance_km, green_cover_index]`.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: [f64; 3],
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),
}

impl LinearModel {
    /// Load the artifact from disk. A missing or malformed file is fatal to
    /// startup; there is no fallback model.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        let model = serde_json::from_str(&raw)?;
        Ok(model)
    }
}

impl ImpactPredictor for LinearModel {
    fn predict(&self, original_aqi: f64, distance_km: f64, green_cover: f64) -> f64 {
        self.intercept
            + self.coefficients[0] * original_aqi
            + self.coefficients[1] * distance_km
            + self.coefficients[2] * green_cover
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_linear_prediction() {
        let model = LinearModel {
            intercept: -20.0,
            coefficients: [1.0, 5.0, 10.0],
        };
        let predicted = model.predict(150.0, 1.0, 0.2);
        assert_eq!(predicted, -20.0 + 150.0 + 5.0 + 2.0);
    }

    #[test]
    fn test_load_artifact() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"intercept": -21.5, "coefficients": [1.0, 5.2, 9.8]}}"#
        )
        .unwrap();

        let model = LinearModel::load(file.path()).unwrap();
        assert_eq!(model.intercept, -21.5);
        assert_eq!(model.coefficients, [1.0, 5.2, 9.8]);
    }

    #[test]
    fn test_missing_artifact_fails() {
        assert!(matches!(
            LinearModel::load("does/not/exist.json"),
            Err(ModelError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_artifact_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"intercept": "not a number"}}"#).unwrap();

        assert!(matches!(
            LinearModel::load(file.path()),
            Err(ModelError::Parse(_))
        ));
    }
}
