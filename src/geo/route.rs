use std::time::Duration;

use super::point::GeoPoint;

/// Number of interpolation steps in a simulated route.
pub const TRACKING_STEPS: u32 = 20;

/// Wall-clock interval between emitted positions.
pub const TRACKING_TICK: Duration = Duration::from_millis(2000);

/// A finite, non-restartable sequence of positions along the straight line
/// from `source` to `destination`.
///
/// The first emitted point is `source` verbatim; the last is forced to be
/// `destination` bit-for-bit so floating-point drift never leaves the
/// marker short of the dropoff. Emits `TRACKING_STEPS + 1` points in
/// total. This is a cosmetic tracking feed, not real telemetry.
#[derive(Debug)]
pub struct RoutePath {
    source: GeoPoint,
    destination: GeoPoint,
    total_steps: u32,
    step: u32,
}

impl RoutePath {
    pub fn new(source: GeoPoint, destination: GeoPoint) -> Self {
        Self::with_steps(source, destination, TRACKING_STEPS)
    }

    pub fn with_steps(source: GeoPoint, destination: GeoPoint, total_steps: u32) -> Self {
        Self {
            source,
            destination,
            total_steps,
            step: 0,
        }
    }
}

impl Iterator for RoutePath {
    type Item = GeoPoint;

    fn next(&mut self) -> Option<GeoPoint> {
        if self.step > self.total_steps {
            return None;
        }

        let point = if self.step == 0 {
            self.source
        } else if self.step == self.total_steps {
            self.destination
        } else {
            let t = f64::from(self.step) / f64::from(self.total_steps);
            GeoPoint::new(
                self.source.lat + (self.destination.lat - self.source.lat) * t,
                self.source.lng + (self.destination.lng - self.source.lng) * t,
            )
        };

        self.step += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total_steps + 1 - self.step) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RoutePath {}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: GeoPoint = GeoPoint {
        lat: 33.9716,
        lng: -6.8498,
    };
    const DEST: GeoPoint = GeoPoint {
        lat: 34.0531,
        lng: -6.7985,
    };

    #[test]
    fn emits_steps_plus_one_points() {
        let points: Vec<GeoPoint> = RoutePath::new(SOURCE, DEST).collect();
        assert_eq!(points.len(), (TRACKING_STEPS + 1) as usize);
    }

    #[test]
    fn endpoints_are_exact() {
        let points: Vec<GeoPoint> = RoutePath::new(SOURCE, DEST).collect();
        // Bit-for-bit, not approximate
        assert_eq!(points.first().copied(), Some(SOURCE));
        assert_eq!(points.last().copied(), Some(DEST));
    }

    #[test]
    fn midpoint_is_halfway() {
        let points: Vec<GeoPoint> = RoutePath::with_steps(SOURCE, DEST, 2).collect();
        assert_eq!(points.len(), 3);
        let mid = points[1];
        assert!((mid.lat - (SOURCE.lat + DEST.lat) / 2.0).abs() < 1e-12);
        assert!((mid.lng - (SOURCE.lng + DEST.lng) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn does_not_restart() {
        let mut path = RoutePath::with_steps(SOURCE, DEST, 1);
        assert!(path.next().is_some());
        assert!(path.next().is_some());
        assert!(path.next().is_none());
        assert!(path.next().is_none());
    }

    #[test]
    fn degenerate_route_stays_put() {
        let points: Vec<GeoPoint> = RoutePath::new(SOURCE, SOURCE).collect();
        assert!(points.iter().all(|p| *p == SOURCE));
    }
}
