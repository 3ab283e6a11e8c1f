// =============================================================================
// Green City Backend - Geospatial Helpers
// =============================================================================

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers, using the
/// haversine formula. Inputs are in degrees.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_identical_points() {
        assert_eq!(haversine(31.3115, 75.5760, 31.3115, 75.5760), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let a = (31.3115, 75.5760);
        let b = (31.2850, 75.6100);
        let d1 = haversine(a.0, a.1, b.0, b.1);
        let d2 = haversine(b.0, b.1, a.0, a.1);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_known_city_distance() {
        // Model Town to Rama Mandi in Jalandhar is roughly 4.4 km.
        let d = haversine(31.3115, 75.5760, 31.2850, 75.6100);
        assert!(d > 4.0 && d < 5.0, "unexpected distance: {}", d);
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = haversine(0.0, 0.0, 0.0, 180.0);
        assert!((d - std::f64::consts::PI * 6371.0).abs() < 1.0);
    }
}
