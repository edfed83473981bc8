use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use uuid::Uuid;

use crate::entities::order::{self, OrderStatus};
use crate::entities::{delivery_settings, restaurant};
use crate::error::{AppError, AppResult};
use crate::geo::{
    delivery_fee, distance_km, filter_nearby, FeeSchedule, GeoPoint, OrderPickupContext,
    RoutePath, DEFAULT_NEARBY_RADIUS_KM,
};
use crate::tracking::{spawn_route_feed, OrderSnapshot};
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Restaurants ============

#[derive(Debug, Deserialize)]
pub struct RestaurantQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RestaurantInfo {
    pub id: i32,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Straight-line distance from the caller, when a location was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// List restaurants, optionally narrowed to those near the caller
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(query): Query<RestaurantQuery>,
) -> AppResult<Json<Vec<RestaurantInfo>>> {
    let restaurants = restaurant::Entity::find().all(state.db.as_ref()).await?;

    let caller = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng);
            if !point.in_bounds() {
                return Err(AppError::BadRequest(
                    "Coordinates out of range".to_string(),
                ));
            }
            Some(point)
        }
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "Both lat and lng are required".to_string(),
            ))
        }
    };

    let restaurants = match caller {
        Some(_) => filter_nearby(
            restaurants,
            caller,
            query.radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM),
            |r| Some(GeoPoint::new(r.lat, r.lng)),
        ),
        None => restaurants,
    };

    let responses = restaurants
        .into_iter()
        .map(|r| RestaurantInfo {
            distance_km: caller.map(|c| distance_km(c, GeoPoint::new(r.lat, r.lng))),
            id: r.id,
            name: r.name,
            lat: r.lat,
            lng: r.lng,
        })
        .collect();

    Ok(Json(responses))
}

// ============ Fee quotes ============

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub restaurant_id: i32,
    pub delivery_lat: Option<f64>,
    pub delivery_lng: Option<f64>,
    pub order_value: f64,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub delivery_fee: f64,
    pub free_delivery: bool,
}

/// Resolve the delivery point from an optional lat/lng pair.
/// Half a pair is an error; a whole missing pair is allowed — the fee
/// estimator degrades to the base fee.
fn delivery_point(lat: Option<f64>, lng: Option<f64>) -> AppResult<Option<GeoPoint>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng);
            if !point.in_bounds() {
                return Err(AppError::BadRequest(
                    "Delivery coordinates out of range".to_string(),
                ));
            }
            Ok(Some(point))
        }
        (None, None) => Ok(None),
        _ => Err(AppError::BadRequest(
            "Both delivery_lat and delivery_lng are required".to_string(),
        )),
    }
}

pub async fn load_fee_schedule(state: &AppState) -> AppResult<FeeSchedule> {
    let settings = delivery_settings::Entity::find().one(state.db.as_ref()).await?;

    Ok(settings
        .map(|s| FeeSchedule {
            base_fee: s.base_fee,
            km_fee: s.km_fee,
            free_delivery_minimum: s.free_delivery_minimum,
        })
        .unwrap_or_default())
}

/// Estimate the delivery fee for a cart before checkout
pub async fn quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<Json<QuoteResponse>> {
    if payload.order_value < 0.0 {
        return Err(AppError::BadRequest(
            "Order value must not be negative".to_string(),
        ));
    }

    let restaurant = restaurant::Entity::find_by_id(payload.restaurant_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let ctx = OrderPickupContext {
        restaurant_location: Some(GeoPoint::new(restaurant.lat, restaurant.lng)),
        delivery_location: delivery_point(payload.delivery_lat, payload.delivery_lng)?,
        order_value: payload.order_value,
    };

    let schedule = load_fee_schedule(&state).await?;
    let fee = delivery_fee(&ctx, &schedule);

    Ok(Json(QuoteResponse {
        distance_km: ctx.distance_km(),
        delivery_fee: fee,
        free_delivery: fee == 0.0,
    }))
}

// ============ Orders ============

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: i32,
    pub delivery_lat: Option<f64>,
    pub delivery_lng: Option<f64>,
    pub order_value: f64,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub restaurant_id: i32,
    pub restaurant_name: String,
    pub status: OrderStatus,
    pub order_value: f64,
    pub delivery_fee: f64,
    pub delivery_lat: Option<f64>,
    pub delivery_lng: Option<f64>,
    pub delivery_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

fn order_response(order: order::Model, restaurant_name: String) -> OrderResponse {
    OrderResponse {
        id: order.id,
        restaurant_id: order.restaurant_id,
        restaurant_name,
        status: order.status,
        order_value: order.order_value,
        delivery_fee: order.delivery_fee,
        delivery_lat: order.delivery_lat,
        delivery_lng: order.delivery_lng,
        delivery_address: order.delivery_address,
        created_at: order.created_at.with_timezone(&Utc),
        delivered_at: order.delivered_at.map(|t| t.with_timezone(&Utc)),
    }
}

/// Place an order. The delivery fee is computed server-side from the
/// current settings; the chosen map point is reverse-geocoded best-effort.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<OrderResponse>> {
    if payload.order_value <= 0.0 {
        return Err(AppError::BadRequest(
            "Order value must be positive".to_string(),
        ));
    }

    let restaurant = restaurant::Entity::find_by_id(payload.restaurant_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let dropoff = delivery_point(payload.delivery_lat, payload.delivery_lng)?;

    let ctx = OrderPickupContext {
        restaurant_location: Some(GeoPoint::new(restaurant.lat, restaurant.lng)),
        delivery_location: dropoff,
        order_value: payload.order_value,
    };

    let schedule = load_fee_schedule(&state).await?;
    let fee = delivery_fee(&ctx, &schedule);

    let address = match dropoff {
        Some(point) => state.geocoder.reverse(point).await,
        None => None,
    };

    let new_order = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(claims.sub),
        restaurant_id: Set(restaurant.id),
        driver_id: Set(None),
        status: Set(OrderStatus::Pending),
        order_value: Set(payload.order_value),
        delivery_fee: Set(fee),
        delivery_lat: Set(dropoff.map(|p| p.lat)),
        delivery_lng: Set(dropoff.map(|p| p.lng)),
        delivery_address: Set(address),
        ..Default::default()
    };

    let order = new_order.insert(state.db.as_ref()).await?;
    tracing::info!(order_id = %order.id, fee, "order placed");

    Ok(Json(order_response(order, restaurant.name)))
}

/// List the caller's orders, newest first
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let orders = order::Entity::find()
        .filter(order::Column::CustomerId.eq(claims.sub))
        .order_by_desc(order::Column::CreatedAt)
        .all(state.db.as_ref())
        .await?;

    let restaurants = restaurant::Entity::find().all(state.db.as_ref()).await?;

    let responses = orders
        .into_iter()
        .map(|o| {
            let name = restaurants
                .iter()
                .find(|r| r.id == o.restaurant_id)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            order_response(o, name)
        })
        .collect();

    Ok(Json(responses))
}

async fn find_own_order(
    state: &AppState,
    claims: &Claims,
    order_id: Uuid,
) -> AppResult<order::Model> {
    let order = order::Entity::find_by_id(order_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if order.customer_id != claims.sub {
        return Err(AppError::Forbidden("Not your order".to_string()));
    }

    Ok(order)
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    let order = find_own_order(&state, &claims, order_id).await?;

    let name = restaurant::Entity::find_by_id(order.restaurant_id)
        .one(state.db.as_ref())
        .await?
        .map(|r| r.name)
        .unwrap_or_default();

    Ok(Json(order_response(order, name)))
}

/// Cancel an order that no driver has picked up yet
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let order = find_own_order(&state, &claims, order_id).await?;

    if order.status != OrderStatus::Pending {
        return Err(AppError::Conflict(
            "Only pending orders can be cancelled".to_string(),
        ));
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Cancelled);
    let cancelled = active.update(state.db.as_ref()).await?;

    state.feeds.publish(OrderSnapshot {
        order_id: cancelled.id,
        status: cancelled.status,
        driver_id: cancelled.driver_id,
    });

    Ok(Json(serde_json::json!({ "message": "Order cancelled" })))
}

// ============ Live feeds ============

/// Stream order status changes as server-sent events.
///
/// The first event is always the current snapshot; the stream ends when
/// the order reaches a terminal status or the client disconnects.
pub async fn order_events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let order = find_own_order(&state, &claims, order_id).await?;

    let rx = state.feeds.subscribe(OrderSnapshot {
        order_id: order.id,
        status: order.status,
        driver_id: order.driver_id,
    });

    let stream = WatchStream::new(rx)
        .map(|snapshot| Event::default().event("status").json_data(&snapshot));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Stream a simulated courier position for an order that is out for
/// delivery: linear interpolation from the restaurant to the dropoff, one
/// event per tick, ending exactly at the dropoff.
pub async fn track_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let order = find_own_order(&state, &claims, order_id).await?;

    if order.status != OrderStatus::OnTheWay {
        return Err(AppError::Conflict(
            "Order is not out for delivery".to_string(),
        ));
    }

    let restaurant = restaurant::Entity::find_by_id(order.restaurant_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let dropoff = match (order.delivery_lat, order.delivery_lng) {
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng),
        _ => {
            return Err(AppError::BadRequest(
                "Order has no delivery location to track".to_string(),
            ))
        }
    };

    let path = RoutePath::new(GeoPoint::new(restaurant.lat, restaurant.lng), dropoff);
    let stream =
        spawn_route_feed(path).map(|point| Event::default().event("position").json_data(&point));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
