use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, customer, driver};
use crate::middleware::auth::{auth_middleware, require_admin, require_customer, require_driver};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let driver_governor = create_role_governor(RateLimitedRole::Driver);
    let customer_governor = create_role_governor(RateLimitedRole::Customer);
    let public_governor = create_public_governor();

    // Public routes (IP rate limited)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let public_routes = Router::new()
        .route("/restaurants", get(customer::list_restaurants))
        .route("/quote", post(customer::quote))
        .layer(public_governor);

    // Customer routes (requires auth + customer role)
    let customer_routes = Router::new()
        .route("/", post(customer::create_order))
        .route("/", get(customer::my_orders))
        .route("/{id}", get(customer::get_order))
        .route("/{id}/cancel", post(customer::cancel_order))
        .route("/{id}/events", get(customer::order_events))
        .route("/{id}/track", get(customer::track_order))
        .layer(customer_governor)
        .layer(middleware::from_fn(require_customer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Driver routes (requires auth + driver role)
    let driver_routes = Router::new()
        .route("/profile", get(driver::my_profile))
        .route("/location", put(driver::update_location))
        .route("/status", put(driver::update_status))
        .route("/orders/nearby", get(driver::nearby_orders))
        .route("/orders/{id}/accept", post(driver::accept_order))
        .route("/orders/{id}/start", post(driver::start_delivery))
        .route("/orders/{id}/complete", post(driver::complete_order))
        .route("/earnings", get(driver::earnings_summary))
        .layer(driver_governor)
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role; no per-user limiter)
    let admin_routes = Router::new()
        .route("/settings", get(admin::get_settings))
        .route("/settings", put(admin::update_settings))
        .route("/restaurants", post(admin::create_restaurant))
        .route("/restaurants/{id}", put(admin::update_restaurant))
        .route("/restaurants/{id}", delete(admin::delete_restaurant))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/drivers", get(admin::list_drivers))
        .route("/drivers/{id}/rate", put(admin::update_driver_rate))
        .route("/orders", get(admin::list_orders))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/orders", customer_routes)
        .nest("/api/driver", driver_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
