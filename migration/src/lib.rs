pub use sea_orm_migration::prelude::*;

mod m20250112_000001_create_users;
mod m20250112_000002_create_restaurants;
mod m20250112_000003_create_delivery_settings;
mod m20250112_000004_create_driver_profiles;
mod m20250112_000005_create_orders;
mod m20250112_000006_create_driver_daily_stats;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250112_000001_create_users::Migration),
            Box::new(m20250112_000002_create_restaurants::Migration),
            Box::new(m20250112_000003_create_delivery_settings::Migration),
            Box::new(m20250112_000004_create_driver_profiles::Migration),
            Box::new(m20250112_000005_create_orders::Migration),
            Box::new(m20250112_000006_create_driver_daily_stats::Migration),
        ]
    }
}
