//! Geo-distance and delivery-economics primitives.
//!
//! Every distance-derived number on the platform (delivery fee, driver
//! earning, nearby-order matching, the tracking simulation) goes through
//! this module so the formulas exist in exactly one place.

pub mod distance;
pub mod earnings;
pub mod fee;
pub mod nearby;
pub mod point;
pub mod route;

pub use distance::distance_km;
pub use earnings::{driver_earning, DEFAULT_RATE_PER_KM};
pub use fee::{delivery_fee, FeeSchedule, OrderPickupContext};
pub use nearby::{filter_nearby, DEFAULT_NEARBY_RADIUS_KM};
pub use point::GeoPoint;
pub use route::{RoutePath, TRACKING_STEPS, TRACKING_TICK};
