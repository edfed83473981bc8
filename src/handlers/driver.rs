use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::driver_profile::{self, DriverStatus};
use crate::entities::order::{self, OrderStatus};
use crate::entities::{driver_daily_stats, restaurant};
use crate::error::{AppError, AppResult};
use crate::geo::fee::round_to_cents;
use crate::geo::{
    distance_km, driver_earning, filter_nearby, GeoPoint, OrderPickupContext,
    DEFAULT_NEARBY_RADIUS_KM, DEFAULT_RATE_PER_KM,
};
use crate::tracking::OrderSnapshot;
use crate::utils::jwt::Claims;
use crate::AppState;

async fn find_profile(state: &AppState, driver_id: Uuid) -> AppResult<driver_profile::Model> {
    driver_profile::Entity::find_by_id(driver_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Driver profile not found".to_string()))
}

fn profile_location(profile: &driver_profile::Model) -> Option<GeoPoint> {
    match (profile.current_lat, profile.current_lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    }
}

fn order_snapshot(order: &order::Model) -> OrderSnapshot {
    OrderSnapshot {
        order_id: order.id,
        status: order.status,
        driver_id: order.driver_id,
    }
}

// ============ Profile ============

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub status: DriverStatus,
    pub rate_per_km: f64,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
    pub total_earnings: f64,
    pub total_deliveries: i32,
}

pub async fn my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = find_profile(&state, claims.sub).await?;

    Ok(Json(ProfileResponse {
        status: profile.status,
        rate_per_km: profile.rate_per_km.unwrap_or(DEFAULT_RATE_PER_KM),
        current_lat: profile.current_lat,
        current_lng: profile.current_lng,
        total_earnings: profile.total_earnings,
        total_deliveries: profile.total_deliveries,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

/// Report the driver's current position (the driver app pushes this
/// whenever the device GPS resolves)
pub async fn update_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateLocationRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let point = GeoPoint::new(payload.lat, payload.lng);
    if !point.in_bounds() {
        return Err(AppError::BadRequest(
            "Coordinates out of range".to_string(),
        ));
    }

    let profile = find_profile(&state, claims.sub).await?;
    let mut active: driver_profile::ActiveModel = profile.into();
    active.current_lat = Set(Some(point.lat));
    active.current_lng = Set(Some(point.lng));
    active.updated_at = Set(Utc::now().into());
    active.update(state.db.as_ref()).await?;

    Ok(Json(serde_json::json!({ "message": "Location updated" })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DriverStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let profile = find_profile(&state, claims.sub).await?;

    // A driver with an order in flight cannot leave the busy state
    if profile.status == DriverStatus::Busy && payload.status != DriverStatus::Busy {
        let active_orders = order::Entity::find()
            .filter(order::Column::DriverId.eq(claims.sub))
            .filter(order::Column::Status.is_in([OrderStatus::Accepted, OrderStatus::OnTheWay]))
            .all(state.db.as_ref())
            .await?;

        if !active_orders.is_empty() {
            return Err(AppError::Conflict(
                "Finish or hand back the active delivery first".to_string(),
            ));
        }
    }

    let mut active: driver_profile::ActiveModel = profile.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    active.update(state.db.as_ref()).await?;

    Ok(Json(serde_json::json!({ "message": "Status updated" })))
}

// ============ Order matching ============

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct NearbyOrderResponse {
    pub order_id: Uuid,
    pub restaurant_name: String,
    pub restaurant_lat: f64,
    pub restaurant_lng: f64,
    pub delivery_lat: Option<f64>,
    pub delivery_lng: Option<f64>,
    pub order_value: f64,
    /// Distance from the driver to the pickup point
    pub pickup_distance_km: f64,
    pub estimated_earning: f64,
}

/// List unassigned orders whose pickup point is within the radius of the
/// driver's last reported position. With no position on file this is an
/// empty list, never an error.
pub async fn nearby_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<NearbyQuery>,
) -> AppResult<Json<Vec<NearbyOrderResponse>>> {
    let profile = find_profile(&state, claims.sub).await?;
    let driver_location = profile_location(&profile);
    let rate = profile.rate_per_km.unwrap_or(DEFAULT_RATE_PER_KM);

    let pending = order::Entity::find()
        .filter(order::Column::Status.eq(OrderStatus::Pending))
        .filter(order::Column::DriverId.is_null())
        .all(state.db.as_ref())
        .await?;

    let restaurants = restaurant::Entity::find().all(state.db.as_ref()).await?;

    let candidates: Vec<(order::Model, Option<GeoPoint>)> = pending
        .into_iter()
        .map(|o| {
            let pickup = restaurants
                .iter()
                .find(|r| r.id == o.restaurant_id)
                .map(|r| GeoPoint::new(r.lat, r.lng));
            (o, pickup)
        })
        .collect();

    let nearby = filter_nearby(
        candidates,
        driver_location,
        query.radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM),
        |(_, pickup)| *pickup,
    );

    let responses = nearby
        .into_iter()
        .filter_map(|(o, pickup)| {
            let pickup = pickup?;
            let driver = driver_location?;
            let restaurant_name = restaurants
                .iter()
                .find(|r| r.id == o.restaurant_id)
                .map(|r| r.name.clone())
                .unwrap_or_default();

            let ctx = OrderPickupContext {
                restaurant_location: Some(pickup),
                delivery_location: match (o.delivery_lat, o.delivery_lng) {
                    (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
                    _ => None,
                },
                order_value: o.order_value,
            };

            Some(NearbyOrderResponse {
                order_id: o.id,
                restaurant_name,
                restaurant_lat: pickup.lat,
                restaurant_lng: pickup.lng,
                delivery_lat: o.delivery_lat,
                delivery_lng: o.delivery_lng,
                order_value: o.order_value,
                pickup_distance_km: distance_km(driver, pickup),
                estimated_earning: driver_earning(&ctx, rate),
            })
        })
        .collect();

    Ok(Json(responses))
}

/// Take a pending order.
///
/// Assigning the order and flipping the driver to busy happen in one
/// database transaction, with the checks inside it: two drivers racing
/// for the same order leave exactly one assignment, the loser gets a
/// conflict.
pub async fn accept_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let driver_id = claims.sub;

    let accepted = state
        .db
        .transaction::<_, order::Model, AppError>(move |txn| {
            Box::pin(async move {
                let profile = driver_profile::Entity::find_by_id(driver_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Driver profile not found".to_string()))?;

                if profile.status != DriverStatus::Available {
                    return Err(AppError::Conflict(
                        "Driver is not available for new orders".to_string(),
                    ));
                }

                let order = order::Entity::find_by_id(order_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

                if order.status != OrderStatus::Pending || order.driver_id.is_some() {
                    return Err(AppError::Conflict(
                        "Order is no longer available".to_string(),
                    ));
                }

                let mut active: order::ActiveModel = order.into();
                active.status = Set(OrderStatus::Accepted);
                active.driver_id = Set(Some(driver_id));
                let accepted = active.update(txn).await?;

                let mut active_profile: driver_profile::ActiveModel = profile.into();
                active_profile.status = Set(DriverStatus::Busy);
                active_profile.updated_at = Set(Utc::now().into());
                active_profile.update(txn).await?;

                Ok(accepted)
            })
        })
        .await
        .map_err(AppError::from)?;

    state.feeds.publish(order_snapshot(&accepted));
    tracing::info!(order_id = %accepted.id, driver_id = %claims.sub, "order accepted");

    Ok(Json(serde_json::json!({ "message": "Order accepted" })))
}

async fn find_assigned_order(
    state: &AppState,
    claims: &Claims,
    order_id: Uuid,
) -> AppResult<order::Model> {
    let order = order::Entity::find_by_id(order_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if order.driver_id != Some(claims.sub) {
        return Err(AppError::Forbidden(
            "You are not assigned to this order".to_string(),
        ));
    }

    Ok(order)
}

/// Leave the restaurant with the food
pub async fn start_delivery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let order = find_assigned_order(&state, &claims, order_id).await?;

    if order.status != OrderStatus::Accepted {
        return Err(AppError::Conflict(
            "Order is not awaiting pickup".to_string(),
        ));
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::OnTheWay);
    let updated = active.update(state.db.as_ref()).await?;

    state.feeds.publish(order_snapshot(&updated));

    Ok(Json(serde_json::json!({ "message": "Delivery started" })))
}

#[derive(Debug, Serialize)]
pub struct CompleteOrderResponse {
    pub order_id: Uuid,
    pub earning: f64,
    pub total_earnings: f64,
    pub total_deliveries: i32,
}

/// Mark an order delivered and credit the driver.
///
/// Order status, lifetime totals, the delivery counter, and the per-day
/// aggregate all change in one database transaction; if any write fails
/// the order stays not-completed, keeping earnings and status consistent.
pub async fn complete_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<CompleteOrderResponse>> {
    let order = find_assigned_order(&state, &claims, order_id).await?;

    if order.status != OrderStatus::OnTheWay {
        return Err(AppError::Conflict(
            "Order is not out for delivery".to_string(),
        ));
    }

    let restaurant = restaurant::Entity::find_by_id(order.restaurant_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let profile = find_profile(&state, claims.sub).await?;
    let rate = profile.rate_per_km.unwrap_or(DEFAULT_RATE_PER_KM);

    let ctx = OrderPickupContext {
        restaurant_location: Some(GeoPoint::new(restaurant.lat, restaurant.lng)),
        delivery_location: match (order.delivery_lat, order.delivery_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        },
        order_value: order.order_value,
    };

    let earning = driver_earning(&ctx, rate);
    let driver_id = claims.sub;
    let today: NaiveDate = Utc::now().date_naive();

    let delivered = state
        .db
        .transaction::<_, order::Model, AppError>(move |txn| {
            Box::pin(async move {
                // Re-read inside the transaction; a concurrent completion
                // or cancellation aborts here
                let order = order::Entity::find_by_id(order_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| AppError::Conflict("Order disappeared".to_string()))?;

                if order.status != OrderStatus::OnTheWay || order.driver_id != Some(driver_id) {
                    return Err(AppError::Conflict(
                        "Order changed while completing".to_string(),
                    ));
                }

                let mut active: order::ActiveModel = order.into();
                active.status = Set(OrderStatus::Delivered);
                active.delivered_at = Set(Some(Utc::now().into()));
                let delivered = active.update(txn).await?;

                let profile = driver_profile::Entity::find_by_id(driver_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        AppError::Conflict("Driver profile disappeared".to_string())
                    })?;

                let lifetime_earnings = round_to_cents(profile.total_earnings + earning);
                let lifetime_deliveries = profile.total_deliveries + 1;

                let mut active_profile: driver_profile::ActiveModel = profile.into();
                active_profile.total_earnings = Set(lifetime_earnings);
                active_profile.total_deliveries = Set(lifetime_deliveries);
                active_profile.status = Set(DriverStatus::Available);
                active_profile.updated_at = Set(Utc::now().into());
                active_profile.update(txn).await?;

                match driver_daily_stats::Entity::find_by_id((driver_id, today))
                    .one(txn)
                    .await?
                {
                    Some(day) => {
                        let earnings = round_to_cents(day.earnings + earning);
                        let deliveries = day.deliveries + 1;
                        let mut active_day: driver_daily_stats::ActiveModel = day.into();
                        active_day.earnings = Set(earnings);
                        active_day.deliveries = Set(deliveries);
                        active_day.update(txn).await?;
                    }
                    None => {
                        driver_daily_stats::ActiveModel {
                            driver_id: Set(driver_id),
                            day: Set(today),
                            earnings: Set(round_to_cents(earning)),
                            deliveries: Set(1),
                        }
                        .insert(txn)
                        .await?;
                    }
                }

                Ok(delivered)
            })
        })
        .await
        .map_err(AppError::from)?;

    state.feeds.publish(order_snapshot(&delivered));
    tracing::info!(order_id = %delivered.id, driver_id = %claims.sub, earning, "order delivered");

    let profile = find_profile(&state, claims.sub).await?;

    Ok(Json(CompleteOrderResponse {
        order_id: delivered.id,
        earning,
        total_earnings: profile.total_earnings,
        total_deliveries: profile.total_deliveries,
    }))
}

// ============ Earnings ============

#[derive(Debug, Serialize)]
pub struct EarningsPeriod {
    pub earnings: f64,
    pub deliveries: i32,
}

#[derive(Debug, Serialize)]
pub struct EarningsResponse {
    pub today: EarningsPeriod,
    pub lifetime: EarningsPeriod,
    pub rate_per_km: f64,
}

pub async fn earnings_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<EarningsResponse>> {
    let profile = find_profile(&state, claims.sub).await?;
    let today = Utc::now().date_naive();

    let day = driver_daily_stats::Entity::find_by_id((claims.sub, today))
        .one(state.db.as_ref())
        .await?;

    Ok(Json(EarningsResponse {
        today: EarningsPeriod {
            earnings: day.as_ref().map(|d| d.earnings).unwrap_or(0.0),
            deliveries: day.map(|d| d.deliveries).unwrap_or(0),
        },
        lifetime: EarningsPeriod {
            earnings: profile.total_earnings,
            deliveries: profile.total_deliveries,
        },
        rate_per_km: profile.rate_per_km.unwrap_or(DEFAULT_RATE_PER_KM),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

    use crate::config::Config;
    use crate::entities::user::UserRole;
    use crate::tracking::OrderFeeds;
    use crate::utils::geocode::Geocoder;

    fn test_state(db: DatabaseConnection) -> AppState {
        AppState {
            db: Arc::new(db),
            config: Config {
                database_url: String::new(),
                jwt_secret: "test".to_string(),
                jwt_expiration_hours: 1,
                server_host: String::new(),
                server_port: 0,
                geocode_base_url: None,
            },
            geocoder: Geocoder::new(None),
            feeds: Arc::new(OrderFeeds::new()),
        }
    }

    fn driver_claims(driver_id: Uuid) -> Claims {
        Claims {
            sub: driver_id,
            email: "driver@test.ma".to_string(),
            role: UserRole::Driver,
            exp: 0,
            iat: 0,
        }
    }

    fn available_profile(driver_id: Uuid) -> driver_profile::Model {
        driver_profile::Model {
            user_id: driver_id,
            status: DriverStatus::Available,
            rate_per_km: None,
            current_lat: None,
            current_lng: None,
            total_earnings: 0.0,
            total_deliveries: 0,
            updated_at: Utc::now().into(),
        }
    }

    fn order_taken_by(order_id: Uuid, driver_id: Uuid) -> order::Model {
        order::Model {
            id: order_id,
            customer_id: Uuid::new_v4(),
            restaurant_id: 1,
            driver_id: Some(driver_id),
            status: OrderStatus::Accepted,
            order_value: 60.0,
            delivery_fee: 12.0,
            delivery_lat: None,
            delivery_lng: None,
            delivery_address: None,
            created_at: Utc::now().into(),
            delivered_at: None,
        }
    }

    #[tokio::test]
    async fn accept_rejects_order_taken_by_another_driver() {
        let driver = Uuid::new_v4();
        let rival = Uuid::new_v4();
        let order_id = Uuid::new_v4();

        // By the time the transaction re-reads the order, the rival has
        // already claimed it
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![available_profile(driver)]])
            .append_query_results([vec![order_taken_by(order_id, rival)]])
            .into_connection();

        let result = accept_order(
            State(test_state(db)),
            Extension(driver_claims(driver)),
            Path(order_id),
        )
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn accept_rejects_driver_who_is_not_available() {
        let driver = Uuid::new_v4();
        let order_id = Uuid::new_v4();

        let busy = driver_profile::Model {
            status: DriverStatus::Busy,
            ..available_profile(driver)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![busy]])
            .into_connection();

        let result = accept_order(
            State(test_state(db)),
            Extension(driver_claims(driver)),
            Path(order_id),
        )
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
