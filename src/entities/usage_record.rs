use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only ledger header for parts consumed on a job. Never updated or
/// deleted after insertion; line prices are snapshots taken at creation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_records")]
pub struct Model {
    /// Format `PU-YYYY-MM-DD-NNNN`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub usage_id: String,
    pub employee_id: String,
    pub order_id: String,
    pub usage_date: DateTime<Utc>,
    pub total_value: Decimal,
    pub invoice_id: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub customer_info: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::usage_line::Entity")]
    UsageLines,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::usage_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageLines.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
