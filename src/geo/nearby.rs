use super::distance::distance_km;
use super::point::GeoPoint;

/// Radius within which an open order is surfaced to a driver.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

/// Retains the candidates whose pickup point lies within `radius_km` of
/// the driver's position. Input order is preserved; results are not
/// re-sorted by distance.
///
/// With no driver location (permission denied, GPS not yet resolved) the
/// result is empty rather than an error — the driver app renders "no
/// orders", it does not crash.
pub fn filter_nearby<T>(
    candidates: Vec<T>,
    driver_location: Option<GeoPoint>,
    radius_km: f64,
    pickup_of: impl Fn(&T) -> Option<GeoPoint>,
) -> Vec<T> {
    let Some(driver) = driver_location else {
        return Vec::new();
    };

    candidates
        .into_iter()
        .filter(|candidate| match pickup_of(candidate) {
            Some(pickup) => distance_km(driver, pickup) <= radius_km,
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RABAT: GeoPoint = GeoPoint {
        lat: 33.9716,
        lng: -6.8498,
    };

    fn east_of_rabat(km: f64) -> GeoPoint {
        let deg = km / (111.32 * RABAT.lat.to_radians().cos());
        GeoPoint::new(RABAT.lat, RABAT.lng + deg)
    }

    #[test]
    fn no_driver_location_yields_empty() {
        let candidates = vec![Some(RABAT), Some(east_of_rabat(1.0))];
        let result = filter_nearby(candidates, None, DEFAULT_NEARBY_RADIUS_KM, |p| *p);
        assert!(result.is_empty());
    }

    #[test]
    fn radius_cutoff() {
        // Restaurant 12 km out: dropped at 10 km radius, kept at 15 km
        let candidates = vec![Some(east_of_rabat(12.0))];
        let at_10 = filter_nearby(candidates.clone(), Some(RABAT), 10.0, |p| *p);
        assert!(at_10.is_empty());

        let at_15 = filter_nearby(candidates, Some(RABAT), 15.0, |p| *p);
        assert_eq!(at_15.len(), 1);
    }

    #[test]
    fn preserves_input_order() {
        let far = east_of_rabat(8.0);
        let near = east_of_rabat(1.0);
        let result = filter_nearby(
            vec![Some(far), Some(near)],
            Some(RABAT),
            DEFAULT_NEARBY_RADIUS_KM,
            |p| *p,
        );
        assert_eq!(result, vec![Some(far), Some(near)]);
    }

    #[test]
    fn candidate_without_pickup_is_dropped() {
        let result = filter_nearby(
            vec![None, Some(RABAT)],
            Some(RABAT),
            DEFAULT_NEARBY_RADIUS_KM,
            |p| *p,
        );
        assert_eq!(result, vec![Some(RABAT)]);
    }
}
