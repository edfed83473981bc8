pub mod delivery_settings;
pub mod driver_daily_stats;
pub mod driver_profile;
pub mod order;
pub mod restaurant;
pub mod user;
