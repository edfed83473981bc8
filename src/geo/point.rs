use serde::{Deserialize, Serialize};

/// A latitude/longitude pair on Earth's surface. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when the coordinates fall in the valid WGS84 range.
    ///
    /// The distance math itself is permissive; API handlers use this to
    /// reject out-of-range input at the boundary instead.
    pub fn in_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_check() {
        assert!(GeoPoint::new(33.9716, -6.8498).in_bounds());
        assert!(GeoPoint::new(90.0, 180.0).in_bounds());
        assert!(!GeoPoint::new(91.0, 0.0).in_bounds());
        assert!(!GeoPoint::new(0.0, -180.5).in_bounds());
    }
}
