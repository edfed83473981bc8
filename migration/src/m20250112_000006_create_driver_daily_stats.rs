use sea_orm_migration::{prelude::*, schema::*};

use super::m20250112_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DriverDailyStats::Table)
                    .if_not_exists()
                    .col(uuid(DriverDailyStats::DriverId).not_null())
                    .col(date(DriverDailyStats::Day).not_null())
                    .col(double(DriverDailyStats::Earnings).not_null().default(0.0))
                    .col(
                        integer(DriverDailyStats::Deliveries)
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(DriverDailyStats::DriverId)
                            .col(DriverDailyStats::Day),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_driver_daily_stats_driver")
                            .from(DriverDailyStats::Table, DriverDailyStats::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DriverDailyStats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DriverDailyStats {
    Table,
    DriverId,
    Day,
    Earnings,
    Deliveries,
}
