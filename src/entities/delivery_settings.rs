use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub base_fee: f64,
    pub km_fee: f64,
    /// Order value above which delivery is free; 0 disables the rule.
    pub free_delivery_minimum: f64,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
