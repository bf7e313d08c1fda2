use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One consumed part line. Name, number and unit price are snapshots of the
/// catalog at usage time; later catalog changes must not alter them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub usage_id: String,
    pub part_id: String,
    pub part_name: String,
    pub part_number: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub installation_notes: Option<String>,
    pub warranty_months: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::usage_record::Entity",
        from = "Column::UsageId",
        to = "super::usage_record::Column::UsageId"
    )]
    UsageRecord,
}

impl Related<super::usage_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
