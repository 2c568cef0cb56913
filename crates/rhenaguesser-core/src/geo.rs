//! Great-circle distance between coordinates.

use rhenaguesser_types::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between `a` and `b`, in meters.
///
/// Symmetric and zero for identical points. The intermediate term is
/// clamped so rounding near antipodes cannot push `asin` out of domain.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRASBOURG: Coordinate = Coordinate::new(48.5734, 7.7521);
    const FREIBURG: Coordinate = Coordinate::new(47.9990, 7.8421);

    #[test]
    fn identical_points_are_zero_apart() {
        assert!(distance(STRASBOURG, STRASBOURG).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance(STRASBOURG, FREIBURG);
        let back = distance(FREIBURG, STRASBOURG);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn strasbourg_to_freiburg_is_about_64_km() {
        let d = distance(STRASBOURG, FREIBURG);
        assert!((63_000.0..65_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn antipodes_are_half_the_circumference() {
        let d = distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half).abs() < 1.0, "got {d}");
        assert!((d - 20_015_086.0).abs() < 1_000.0);
    }
}
