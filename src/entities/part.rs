use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog reference data. `unit_price` is the flat legacy field; newer rows
/// carry a structured `pricing` JSON blob with a `retailPrice` key. The
/// normalization between the two happens in the catalog service, never at
/// call sites.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub part_number: String,
    pub unit_price: Option<Decimal>,
    #[sea_orm(column_type = "Json", nullable)]
    pub pricing: Option<Json>,
    pub warranty_months: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::personal_inventory_entry::Entity")]
    PersonalInventoryEntries,
}

impl Related<super::personal_inventory_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonalInventoryEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
