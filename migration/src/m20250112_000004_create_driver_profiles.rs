use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250112_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(DriverStatus::Enum)
                    .values([
                        DriverStatus::Available,
                        DriverStatus::Busy,
                        DriverStatus::Offline,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DriverProfile::Table)
                    .if_not_exists()
                    .col(uuid(DriverProfile::UserId).primary_key())
                    .col(
                        ColumnDef::new(DriverProfile::Status)
                            .custom(DriverStatus::Enum)
                            .not_null(),
                    )
                    .col(double_null(DriverProfile::RatePerKm))
                    .col(double_null(DriverProfile::CurrentLat))
                    .col(double_null(DriverProfile::CurrentLng))
                    .col(double(DriverProfile::TotalEarnings).not_null().default(0.0))
                    .col(
                        integer(DriverProfile::TotalDeliveries)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        timestamp_with_time_zone(DriverProfile::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_driver_profile_user")
                            .from(DriverProfile::Table, DriverProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DriverProfile::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(DriverStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DriverProfile {
    Table,
    UserId,
    Status,
    RatePerKm,
    CurrentLat,
    CurrentLng,
    TotalEarnings,
    TotalDeliveries,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum DriverStatus {
    #[sea_orm(iden = "driver_status")]
    Enum,
    #[sea_orm(iden = "available")]
    Available,
    #[sea_orm(iden = "busy")]
    Busy,
    #[sea_orm(iden = "offline")]
    Offline,
}
