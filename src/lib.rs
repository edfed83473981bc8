pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod tracking;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use crate::tracking::OrderFeeds;
use crate::utils::geocode::Geocoder;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Config,
    pub geocoder: Geocoder,
    pub feeds: Arc<OrderFeeds>,
}
