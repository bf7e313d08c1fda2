use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PartRequestStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "ordered")]
    Ordered,
    #[sea_orm(string_value = "delivered")]
    Delivered,
}

impl std::fmt::Display for PartRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Ordered => "ordered",
            Self::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

/// A technician's ask for parts they lack. Status moves monotonically
/// pending -> approved -> ordered -> delivered, or pending -> rejected
/// (terminal). An ordered request cannot be folded into a second supplier
/// order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "part_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub request_id: String,
    pub requested_for: String,
    pub requested_for_name: String,
    pub status: PartRequestStatus,
    pub supplier_order_id: Option<String>,
    /// Sibling request ids merged into the same supplier order.
    #[sea_orm(column_type = "Json", nullable)]
    pub consolidated_with: Option<Json>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::part_request_line::Entity")]
    PartRequestLines,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::RequestedFor",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::part_request_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartRequestLines.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
