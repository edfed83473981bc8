use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeliverySettings::Table)
                    .if_not_exists()
                    .col(pk_auto(DeliverySettings::Id))
                    .col(double(DeliverySettings::BaseFee).not_null())
                    .col(double(DeliverySettings::KmFee).not_null())
                    .col(double(DeliverySettings::FreeDeliveryMinimum).not_null())
                    .col(
                        timestamp_with_time_zone(DeliverySettings::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Single settings row; FreeDeliveryMinimum = 0 disables the rule
        let insert = Query::insert()
            .into_table(DeliverySettings::Table)
            .columns([
                DeliverySettings::BaseFee,
                DeliverySettings::KmFee,
                DeliverySettings::FreeDeliveryMinimum,
            ])
            .values_panic([(10.0).into(), (1.5).into(), (0.0).into()])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeliverySettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DeliverySettings {
    Table,
    Id,
    BaseFee,
    KmFee,
    FreeDeliveryMinimum,
    UpdatedAt,
}
