use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum SupplierOrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum DeliveryMethod {
    /// One shared destination serving the whole batch.
    #[sea_orm(string_value = "consolidated")]
    #[serde(rename = "consolidated")]
    Consolidated,
    /// One destination per distinct technician in the batch.
    #[sea_orm(string_value = "multi-address")]
    #[serde(rename = "multi-address")]
    MultiAddress,
    /// Legacy value: addressed like `consolidated`, kept for older clients.
    #[sea_orm(string_value = "express")]
    #[serde(rename = "express")]
    Express,
}

/// A consolidated purchase order sent to one supplier, merging one or more
/// approved part requests. Owns its items and delivery addresses.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_orders")]
pub struct Model {
    /// Format `SO-YYYY-MM-DD-NNNN`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: String,
    pub supplier_id: String,
    pub created_by: String,
    /// The request ids this order consolidates.
    #[sea_orm(column_type = "Json")]
    pub part_request_ids: Json,
    pub delivery_method: DeliveryMethod,
    #[sea_orm(column_type = "Json")]
    pub delivery_addresses: Json,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub express_charge: Decimal,
    pub total: Decimal,
    /// Caller-asserted consolidation savings, stored for reporting only.
    pub savings: Decimal,
    pub priority: String,
    pub notes: Option<String>,
    pub status: SupplierOrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::supplier_order_item::Entity")]
    SupplierOrderItems,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::supplier_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierOrderItems.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
