use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One consolidated line per distinct part. `assign_to` keeps the
/// per-request attribution: the sum of its quantities always equals
/// `total_quantity`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: String,
    pub part_id: String,
    pub part_name: String,
    pub unit_price: Decimal,
    pub total_quantity: i32,
    /// Array of {requestId, employeeId, employeeName, quantity}.
    #[sea_orm(column_type = "Json")]
    pub assign_to: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier_order::Entity",
        from = "Column::OrderId",
        to = "super::supplier_order::Column::OrderId"
    )]
    SupplierOrder,
}

impl Related<super::supplier_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
