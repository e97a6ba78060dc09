//! Geographic calculations

use crate::defaults::{TRAFFIC_FACTOR, TRAVEL_SPEED_KMH};
use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair outside [0, 1] for near-antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().atan2((1.0 - a).clamp(0.0, 1.0).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimate travel time in minutes for a straight-line distance
pub fn travel_minutes(distance_km: f64) -> f64 {
    (distance_km.max(0.0) / TRAVEL_SPEED_KMH) * 60.0 * TRAFFIC_FACTOR
}

#[cfg(test)]
pub(crate) fn offset_north(from: &Coordinates, km: f64) -> Coordinates {
    Coordinates {
        lat: from.lat + (km / EARTH_RADIUS_KM).to_degrees(),
        lng: from.lng,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BENGALURU: Coordinates = Coordinates { lat: 12.9716, lng: 77.5946 };

    #[test]
    fn test_haversine_bengaluru_mysuru() {
        let mysuru = Coordinates { lat: 12.2958, lng: 76.6394 };

        let distance = haversine_distance(&BENGALURU, &mysuru);

        // Bengaluru to Mysuru is approximately 128 km as the crow flies
        assert!((distance - 128.0).abs() < 5.0, "got {}", distance);
    }

    #[test]
    fn test_haversine_same_point() {
        let distance = haversine_distance(&BENGALURU, &BENGALURU);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let points = [
            Coordinates { lat: 28.6139, lng: 77.2090 },
            Coordinates { lat: -33.8688, lng: 151.2093 },
            Coordinates { lat: 0.0, lng: 0.0 },
            Coordinates { lat: 89.9, lng: -179.9 },
        ];

        for a in &points {
            for b in &points {
                let ab = haversine_distance(a, b);
                let ba = haversine_distance(b, a);
                assert!((ab - ba).abs() < 1e-9, "{:?} <-> {:?}: {} vs {}", a, b, ab, ba);
                assert!(ab >= 0.0);
            }
        }
    }

    #[test]
    fn test_haversine_monotonic_along_meridian() {
        let mut previous = 0.0;
        for step in 1..=180 {
            let to = Coordinates { lat: -89.0 + step as f64 * 0.99, lng: 10.0 };
            let from = Coordinates { lat: -89.0, lng: 10.0 };
            let distance = haversine_distance(&from, &to);
            assert!(distance >= previous, "step {}: {} < {}", step, distance, previous);
            previous = distance;
        }
    }

    #[test]
    fn test_haversine_antipodal_is_half_circumference() {
        let a = Coordinates { lat: 0.0, lng: 0.0 };
        let b = Coordinates { lat: 0.0, lng: 180.0 };

        let distance = haversine_distance(&a, &b);
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_offset_north_matches_distance() {
        let moved = offset_north(&BENGALURU, 8.0);
        assert!((haversine_distance(&BENGALURU, &moved) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_travel_minutes() {
        // 10 km at 20 km/h is 30 minutes, inflated by 1.3
        assert!((travel_minutes(10.0) - 39.0).abs() < 1e-9);
        assert!((travel_minutes(8.0) - 31.2).abs() < 1e-9);
        assert_eq!(travel_minutes(0.0), 0.0);
    }
}
