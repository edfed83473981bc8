use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Restaurant::Table)
                    .if_not_exists()
                    .col(pk_auto(Restaurant::Id))
                    .col(string_len(Restaurant::Name, 100).not_null().unique_key())
                    .col(double(Restaurant::Lat).not_null())
                    .col(double(Restaurant::Lng).not_null())
                    .col(
                        timestamp_with_time_zone(Restaurant::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed restaurants around Rabat
        let insert = Query::insert()
            .into_table(Restaurant::Table)
            .columns([Restaurant::Name, Restaurant::Lat, Restaurant::Lng])
            .values_panic(["Dar Tajine".into(), (33.9716).into(), (-6.8498).into()])
            .values_panic(["Ocean Grill Agdal".into(), (33.9891).into(), (-6.8541).into()])
            .values_panic(["Couscous House Salé".into(), (34.0531).into(), (-6.7985).into()])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Restaurant::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Restaurant {
    Table,
    Id,
    Name,
    Lat,
    Lng,
    CreatedAt,
}
