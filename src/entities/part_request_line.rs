use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "part_request_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub request_id: String,
    pub part_id: String,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part_request::Entity",
        from = "Column::RequestId",
        to = "super::part_request::Column::RequestId"
    )]
    PartRequest,
}

impl Related<super::part_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
