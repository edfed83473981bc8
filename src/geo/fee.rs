use serde::{Deserialize, Serialize};

use super::distance::distance_km;
use super::point::GeoPoint;

/// Platform-wide fee parameters, edited by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub base_fee: f64,
    pub km_fee: f64,
    /// Order value above which delivery is free for the customer.
    /// Zero disables the rule.
    pub free_delivery_minimum: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: 10.0,
            km_fee: 1.5,
            free_delivery_minimum: 0.0,
        }
    }
}

/// The minimal projection of an order needed by every calculation in this
/// module. Derived from a persisted order at read time, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPickupContext {
    pub restaurant_location: Option<GeoPoint>,
    pub delivery_location: Option<GeoPoint>,
    pub order_value: f64,
}

impl OrderPickupContext {
    /// Pickup-to-dropoff distance, or `None` when either endpoint is
    /// unknown.
    pub fn distance_km(&self) -> Option<f64> {
        match (self.restaurant_location, self.delivery_location) {
            (Some(from), Some(to)) => Some(distance_km(from, to)),
            _ => None,
        }
    }
}

/// Delivery fee the customer pays for an order.
///
/// Orders at or above the free-delivery minimum cost nothing. Otherwise
/// the fee is base + distance * per-km rate, rounded half-up to the cent.
/// A missing location degrades to the base fee alone: the storefront must
/// always be able to show *some* fee.
pub fn delivery_fee(ctx: &OrderPickupContext, schedule: &FeeSchedule) -> f64 {
    if schedule.free_delivery_minimum > 0.0 && ctx.order_value >= schedule.free_delivery_minimum {
        return 0.0;
    }

    let distance = ctx.distance_km().unwrap_or(0.0);
    round_to_cents(schedule.base_fee + distance * schedule.km_fee)
}

/// Round half-up to two decimal places.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const RABAT: GeoPoint = GeoPoint {
        lat: 33.9716,
        lng: -6.8498,
    };

    fn ctx_with_distance_km(km: f64, order_value: f64) -> OrderPickupContext {
        // 1° longitude at this latitude ≈ 111.32 * cos(lat) km
        let deg = km / (111.32 * RABAT.lat.to_radians().cos());
        OrderPickupContext {
            restaurant_location: Some(RABAT),
            delivery_location: Some(GeoPoint::new(RABAT.lat, RABAT.lng + deg)),
            order_value,
        }
    }

    #[test]
    fn base_plus_per_km() {
        // Restaurant in Rabat center, dropoff 5 km east
        let ctx = ctx_with_distance_km(5.0, 50.0);
        let schedule = FeeSchedule {
            base_fee: 10.0,
            km_fee: 1.5,
            free_delivery_minimum: 0.0,
        };
        let fee = delivery_fee(&ctx, &schedule);
        assert!((fee - 17.5).abs() < 0.05, "got {fee}");
    }

    #[test]
    fn free_delivery_above_minimum() {
        let ctx = ctx_with_distance_km(5.0, 120.0);
        let schedule = FeeSchedule {
            base_fee: 10.0,
            km_fee: 1.5,
            free_delivery_minimum: 100.0,
        };
        assert_eq!(delivery_fee(&ctx, &schedule), 0.0);
    }

    #[test]
    fn free_delivery_exactly_at_minimum() {
        let ctx = ctx_with_distance_km(5.0, 100.0);
        let schedule = FeeSchedule {
            base_fee: 10.0,
            km_fee: 1.5,
            free_delivery_minimum: 100.0,
        };
        assert_eq!(delivery_fee(&ctx, &schedule), 0.0);
    }

    #[test]
    fn zero_minimum_disables_free_delivery() {
        let ctx = ctx_with_distance_km(5.0, 10_000.0);
        let schedule = FeeSchedule {
            base_fee: 10.0,
            km_fee: 1.5,
            free_delivery_minimum: 0.0,
        };
        assert!(delivery_fee(&ctx, &schedule) > 0.0);
    }

    #[test]
    fn missing_location_falls_back_to_base_fee() {
        let ctx = OrderPickupContext {
            restaurant_location: Some(RABAT),
            delivery_location: None,
            order_value: 50.0,
        };
        let schedule = FeeSchedule::default();
        assert_eq!(delivery_fee(&ctx, &schedule), schedule.base_fee);
    }

    #[test]
    fn rounds_half_up_to_cents() {
        // 0.125 is exactly representable, so this is a true half case
        assert_eq!(round_to_cents(0.125), 0.13);
        assert_eq!(round_to_cents(2.344), 2.34);
        assert_eq!(round_to_cents(0.0), 0.0);
    }
}
