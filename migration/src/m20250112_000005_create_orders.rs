use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250112_000001_create_users::User;
use super::m20250112_000002_create_restaurants::Restaurant;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(OrderStatus::Enum)
                    .values([
                        OrderStatus::Pending,
                        OrderStatus::Accepted,
                        OrderStatus::OnTheWay,
                        OrderStatus::Delivered,
                        OrderStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(uuid(Order::Id).primary_key())
                    .col(uuid(Order::CustomerId).not_null())
                    .col(integer(Order::RestaurantId).not_null())
                    .col(uuid_null(Order::DriverId))
                    .col(
                        ColumnDef::new(Order::Status)
                            .custom(OrderStatus::Enum)
                            .not_null(),
                    )
                    .col(double(Order::OrderValue).not_null())
                    .col(double(Order::DeliveryFee).not_null())
                    .col(double_null(Order::DeliveryLat))
                    .col(double_null(Order::DeliveryLng))
                    .col(string_null(Order::DeliveryAddress))
                    .col(
                        timestamp_with_time_zone(Order::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Order::DeliveredAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_customer")
                            .from(Order::Table, Order::CustomerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_restaurant")
                            .from(Order::Table, Order::RestaurantId)
                            .to(Restaurant::Table, Restaurant::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_driver")
                            .from(Order::Table, Order::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Order::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(OrderStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Order {
    Table,
    Id,
    CustomerId,
    RestaurantId,
    DriverId,
    Status,
    OrderValue,
    DeliveryFee,
    DeliveryLat,
    DeliveryLng,
    DeliveryAddress,
    CreatedAt,
    DeliveredAt,
}

#[derive(DeriveIden)]
pub enum OrderStatus {
    #[sea_orm(iden = "order_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "on_the_way")]
    OnTheWay,
    #[sea_orm(iden = "delivered")]
    Delivered,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
