use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub role: String,
    /// Preferred delivery destination for multi-address shipments
    /// (paczkomat id or street address).
    pub delivery_point: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::personal_inventory_entry::Entity")]
    PersonalInventoryEntries,
    #[sea_orm(has_many = "super::usage_record::Entity")]
    UsageRecords,
    #[sea_orm(has_many = "super::part_request::Entity")]
    PartRequests,
}

impl Related<super::personal_inventory_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonalInventoryEntries.def()
    }
}

impl Related<super::usage_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageRecords.def()
    }
}

impl Related<super::part_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
