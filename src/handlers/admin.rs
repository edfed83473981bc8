use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::driver_profile::{self, DriverStatus};
use crate::entities::order::{self, OrderStatus};
use crate::entities::user::UserRole;
use crate::entities::{delivery_settings, restaurant, user};
use crate::error::{AppError, AppResult};
use crate::geo::{GeoPoint, DEFAULT_RATE_PER_KM};
use crate::AppState;

// ============ Delivery settings ============

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub base_fee: f64,
    pub km_fee: f64,
    pub free_delivery_minimum: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub base_fee: Option<f64>,
    pub km_fee: Option<f64>,
    pub free_delivery_minimum: Option<f64>,
}

async fn settings_row(state: &AppState) -> AppResult<delivery_settings::Model> {
    delivery_settings::Entity::find()
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::Internal("Delivery settings row missing".to_string()))
}

pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<SettingsResponse>> {
    let settings = settings_row(&state).await?;

    Ok(Json(SettingsResponse {
        base_fee: settings.base_fee,
        km_fee: settings.km_fee,
        free_delivery_minimum: settings.free_delivery_minimum,
        updated_at: settings.updated_at.with_timezone(&Utc),
    }))
}

/// Update the platform fee parameters. Setting `free_delivery_minimum`
/// to 0 disables the free-delivery rule.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<SettingsResponse>> {
    for value in [
        payload.base_fee,
        payload.km_fee,
        payload.free_delivery_minimum,
    ]
    .into_iter()
    .flatten()
    {
        if value < 0.0 {
            return Err(AppError::BadRequest(
                "Fee values must not be negative".to_string(),
            ));
        }
    }

    let settings = settings_row(&state).await?;
    let mut active: delivery_settings::ActiveModel = settings.into();

    if let Some(base_fee) = payload.base_fee {
        active.base_fee = Set(base_fee);
    }
    if let Some(km_fee) = payload.km_fee {
        active.km_fee = Set(km_fee);
    }
    if let Some(minimum) = payload.free_delivery_minimum {
        active.free_delivery_minimum = Set(minimum);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(state.db.as_ref()).await?;
    tracing::info!("delivery settings updated");

    Ok(Json(SettingsResponse {
        base_fee: updated.base_fee,
        km_fee: updated.km_fee,
        free_delivery_minimum: updated.free_delivery_minimum,
        updated_at: updated.updated_at.with_timezone(&Utc),
    }))
}

// ============ Restaurant management ============

#[derive(Debug, Deserialize)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub async fn create_restaurant(
    State(state): State<AppState>,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<Json<restaurant::Model>> {
    if !GeoPoint::new(payload.lat, payload.lng).in_bounds() {
        return Err(AppError::BadRequest(
            "Coordinates out of range".to_string(),
        ));
    }

    let existing = restaurant::Entity::find()
        .filter(restaurant::Column::Name.eq(&payload.name))
        .one(state.db.as_ref())
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Restaurant name already exists".to_string(),
        ));
    }

    let new_restaurant = restaurant::ActiveModel {
        name: Set(payload.name),
        lat: Set(payload.lat),
        lng: Set(payload.lng),
        ..Default::default()
    };

    let result = new_restaurant.insert(state.db.as_ref()).await?;
    Ok(Json(result))
}

pub async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRestaurantRequest>,
) -> AppResult<Json<restaurant::Model>> {
    let restaurant = restaurant::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let new_lat = payload.lat.unwrap_or(restaurant.lat);
    let new_lng = payload.lng.unwrap_or(restaurant.lng);
    if !GeoPoint::new(new_lat, new_lng).in_bounds() {
        return Err(AppError::BadRequest(
            "Coordinates out of range".to_string(),
        ));
    }

    let mut active: restaurant::ActiveModel = restaurant.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    active.lat = Set(new_lat);
    active.lng = Set(new_lng);

    let result = active.update(state.db.as_ref()).await?;
    Ok(Json(result))
}

pub async fn delete_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let open_orders = order::Entity::find()
        .filter(order::Column::RestaurantId.eq(id))
        .filter(order::Column::Status.is_in([
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::OnTheWay,
        ]))
        .all(state.db.as_ref())
        .await?;

    if !open_orders.is_empty() {
        return Err(AppError::Conflict(
            "Restaurant has open orders".to_string(),
        ));
    }

    let result = restaurant::Entity::delete_by_id(id).exec(state.db.as_ref()).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Restaurant not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Restaurant deleted" })))
}

// ============ User management ============

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find().all(state.db.as_ref()).await?;

    let responses = users
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Change a user's role. Promoting to driver provisions a driver profile;
/// demoting removes it (finished orders keep their driver reference).
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = user::Entity::find_by_id(user_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let old_role = user.role.clone();

    if old_role == UserRole::Driver && payload.role != UserRole::Driver {
        let active_orders = order::Entity::find()
            .filter(order::Column::DriverId.eq(user_id))
            .filter(order::Column::Status.is_in([OrderStatus::Accepted, OrderStatus::OnTheWay]))
            .all(state.db.as_ref())
            .await?;

        if !active_orders.is_empty() {
            return Err(AppError::Conflict(
                "Driver has an active delivery".to_string(),
            ));
        }

        driver_profile::Entity::delete_by_id(user_id)
            .exec(state.db.as_ref())
            .await?;
    }

    if old_role != UserRole::Driver && payload.role == UserRole::Driver {
        driver_profile::ActiveModel {
            user_id: Set(user_id),
            status: Set(DriverStatus::Offline),
            rate_per_km: Set(None),
            total_earnings: Set(0.0),
            total_deliveries: Set(0),
            ..Default::default()
        }
        .insert(state.db.as_ref())
        .await?;
    }

    let mut active: user::ActiveModel = user.into();
    active.role = Set(payload.role);
    let updated = active.update(state.db.as_ref()).await?;

    Ok(Json(UserResponse {
        id: updated.id,
        email: updated.email,
        name: updated.name,
        role: updated.role,
        created_at: updated.created_at.with_timezone(&Utc),
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role == UserRole::Driver {
        let active_orders = order::Entity::find()
            .filter(order::Column::DriverId.eq(id))
            .filter(order::Column::Status.is_in([OrderStatus::Accepted, OrderStatus::OnTheWay]))
            .all(state.db.as_ref())
            .await?;

        if !active_orders.is_empty() {
            return Err(AppError::Conflict(
                "Driver has an active delivery".to_string(),
            ));
        }
    }

    // Profiles, stats and orders are cleaned up by foreign keys
    user::Entity::delete_by_id(id).exec(state.db.as_ref()).await?;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ============ Drivers ============

#[derive(Debug, Serialize)]
pub struct DriverResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: DriverStatus,
    pub rate_per_km: f64,
    pub total_earnings: f64,
    pub total_deliveries: i32,
}

pub async fn list_drivers(State(state): State<AppState>) -> AppResult<Json<Vec<DriverResponse>>> {
    let drivers = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Driver))
        .all(state.db.as_ref())
        .await?;

    let profiles = driver_profile::Entity::find().all(state.db.as_ref()).await?;

    let responses = drivers
        .into_iter()
        .filter_map(|d| {
            let profile = profiles.iter().find(|p| p.user_id == d.id)?;
            Some(DriverResponse {
                id: d.id,
                email: d.email,
                name: d.name,
                status: profile.status,
                rate_per_km: profile.rate_per_km.unwrap_or(DEFAULT_RATE_PER_KM),
                total_earnings: profile.total_earnings,
                total_deliveries: profile.total_deliveries,
            })
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDriverRateRequest {
    /// `null` reverts the driver to the platform default rate
    pub rate_per_km: Option<f64>,
}

pub async fn update_driver_rate(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
    Json(payload): Json<UpdateDriverRateRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if let Some(rate) = payload.rate_per_km {
        if rate <= 0.0 {
            return Err(AppError::BadRequest(
                "Rate must be positive".to_string(),
            ));
        }
    }

    let profile = driver_profile::Entity::find_by_id(driver_id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Driver profile not found".to_string()))?;

    let mut active: driver_profile::ActiveModel = profile.into();
    active.rate_per_km = Set(payload.rate_per_km);
    active.updated_at = Set(Utc::now().into());
    active.update(state.db.as_ref()).await?;

    Ok(Json(serde_json::json!({ "message": "Driver rate updated" })))
}

// ============ Orders ============

#[derive(Debug, Serialize)]
pub struct AdminOrderResponse {
    pub id: Uuid,
    pub customer_name: String,
    pub restaurant_name: String,
    pub driver_id: Option<Uuid>,
    pub status: OrderStatus,
    pub order_value: f64,
    pub delivery_fee: f64,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

pub async fn list_orders(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminOrderResponse>>> {
    let orders = order::Entity::find()
        .order_by_desc(order::Column::CreatedAt)
        .all(state.db.as_ref())
        .await?;

    let users = user::Entity::find().all(state.db.as_ref()).await?;
    let restaurants = restaurant::Entity::find().all(state.db.as_ref()).await?;

    let responses = orders
        .into_iter()
        .map(|o| AdminOrderResponse {
            id: o.id,
            customer_name: users
                .iter()
                .find(|u| u.id == o.customer_id)
                .map(|u| u.name.clone())
                .unwrap_or_default(),
            restaurant_name: restaurants
                .iter()
                .find(|r| r.id == o.restaurant_id)
                .map(|r| r.name.clone())
                .unwrap_or_default(),
            driver_id: o.driver_id,
            status: o.status,
            order_value: o.order_value,
            delivery_fee: o.delivery_fee,
            created_at: o.created_at.with_timezone(&Utc),
            delivered_at: o.delivered_at.map(|t| t.with_timezone(&Utc)),
        })
        .collect();

    Ok(Json(responses))
}
