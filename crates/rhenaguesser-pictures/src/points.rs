//! Random search-point generation.
//!
//! Pictures are discovered by probing the provider around random points,
//! so the session's locations are spread over the configured areas rather
//! than clustered where the provider happens to have most coverage.

use rand::Rng;
use rand::seq::IndexedRandom;
use rhenaguesser_types::Coordinate;

use crate::config::SearchArea;

/// Draw `count` uniformly distributed points.
///
/// Each point first picks one valid area at random, then a point inside
/// it. Invalid areas are ignored; with no valid area the result is empty.
pub fn random_points(areas: &[SearchArea], count: usize, rng: &mut impl Rng) -> Vec<Coordinate> {
    let valid: Vec<&SearchArea> = areas.iter().filter(|a| a.is_valid()).collect();
    let mut points = Vec::with_capacity(count);

    while points.len() < count {
        let Some(area) = valid.choose(rng) else {
            break;
        };
        let point = Coordinate::new(
            rng.random_range(area.min_latitude..=area.max_latitude),
            rng.random_range(area.min_longitude..=area.max_longitude),
        );
        if area.contains(point) {
            points.push(point);
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn area(name: &str, lat: (f64, f64), lng: (f64, f64)) -> SearchArea {
        SearchArea {
            name: name.to_owned(),
            min_latitude: lat.0,
            max_latitude: lat.1,
            min_longitude: lng.0,
            max_longitude: lng.1,
        }
    }

    #[test]
    fn points_fall_inside_some_area() {
        let areas = vec![
            area("north", (50.0, 51.0), (2.0, 3.0)),
            area("south", (43.0, 44.0), (5.0, 6.0)),
        ];
        let mut rng = SmallRng::seed_from_u64(7);
        let points = random_points(&areas, 50, &mut rng);

        assert_eq!(points.len(), 50);
        for point in points {
            assert!(areas.iter().any(|a| a.contains(point)), "{point:?} outside areas");
        }
    }

    #[test]
    fn invalid_areas_yield_nothing() {
        let areas = vec![area("broken", (10.0, 5.0), (0.0, 1.0))];
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(random_points(&areas, 3, &mut rng).is_empty());
    }

    #[test]
    fn degenerate_area_yields_its_single_point() {
        let areas = vec![area("pin", (48.5, 48.5), (7.7, 7.7))];
        let mut rng = SmallRng::seed_from_u64(1);
        let points = random_points(&areas, 2, &mut rng);
        assert_eq!(points, vec![Coordinate::new(48.5, 7.7); 2]);
    }
}
