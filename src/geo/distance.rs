use super::point::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points using the Haversine formula.
/// Returns kilometers. No input validation; callers supply valid
/// coordinates (see `GeoPoint::in_bounds`).
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const RABAT: GeoPoint = GeoPoint {
        lat: 33.9716,
        lng: -6.8498,
    };

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_km(RABAT, RABAT), 0.0);
    }

    #[test]
    fn symmetric() {
        let casablanca = GeoPoint::new(33.5731, -7.5898);
        let there = distance_km(RABAT, casablanca);
        let back = distance_km(casablanca, RABAT);
        assert!((there - back).abs() < 1e-9);
        // Rabat-Casablanca is roughly 87 km as the crow flies
        assert!(there > 80.0 && there < 95.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        // 1° latitude ≈ 111 km everywhere on the sphere
        let north = GeoPoint::new(RABAT.lat + 1.0, RABAT.lng);
        let d = distance_km(RABAT, north);
        assert!((d - 111.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn antipodal_is_half_circumference() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let d = distance_km(a, b);
        assert!((d - std::f64::consts::PI * 6371.0).abs() < 1.0);
    }
}
