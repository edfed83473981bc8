use super::fee::OrderPickupContext;

/// Platform default per-km driver rate, applied when a driver has no rate
/// of their own on file.
pub const DEFAULT_RATE_PER_KM: f64 = 2.0;

/// What the driver earns for completing an order: exactly distance times
/// their per-km rate. Rounding to cents happens where earnings are
/// accumulated, not here, so repeated payouts never compound rounding.
///
/// The free-delivery promotion discounts the customer, not the driver, so
/// no exemption applies here. A missing location yields exactly 0 — a
/// driver is never paid for a task with no computable route.
pub fn driver_earning(ctx: &OrderPickupContext, rate_per_km: f64) -> f64 {
    match ctx.distance_km() {
        Some(distance) => distance * rate_per_km,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::point::GeoPoint;

    const RABAT: GeoPoint = GeoPoint {
        lat: 33.9716,
        lng: -6.8498,
    };
    const SALE: GeoPoint = GeoPoint {
        lat: 34.0531,
        lng: -6.7985,
    };

    #[test]
    fn is_exactly_distance_times_rate() {
        let ctx = OrderPickupContext {
            restaurant_location: Some(RABAT),
            delivery_location: Some(SALE),
            order_value: 80.0,
        };
        let distance = ctx.distance_km().unwrap();
        assert_eq!(driver_earning(&ctx, 2.5), distance * 2.5);
    }

    #[test]
    fn scales_linearly_with_rate() {
        let ctx = OrderPickupContext {
            restaurant_location: Some(RABAT),
            delivery_location: Some(SALE),
            order_value: 80.0,
        };
        let at_one = driver_earning(&ctx, 1.0);
        assert!(at_one > 0.0);
        assert_eq!(driver_earning(&ctx, 3.0), 3.0 * at_one);
    }

    #[test]
    fn ignores_free_delivery_minimum() {
        // Order value is irrelevant to driver pay
        let cheap = OrderPickupContext {
            restaurant_location: Some(RABAT),
            delivery_location: Some(SALE),
            order_value: 5.0,
        };
        let expensive = OrderPickupContext {
            order_value: 500.0,
            ..cheap
        };
        assert_eq!(
            driver_earning(&cheap, DEFAULT_RATE_PER_KM),
            driver_earning(&expensive, DEFAULT_RATE_PER_KM)
        );
    }

    #[test]
    fn missing_location_earns_zero() {
        let ctx = OrderPickupContext {
            restaurant_location: None,
            delivery_location: Some(SALE),
            order_value: 80.0,
        };
        assert_eq!(driver_earning(&ctx, DEFAULT_RATE_PER_KM), 0.0);
    }
}
