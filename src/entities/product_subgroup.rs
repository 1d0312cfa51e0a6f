//! Product subgroup entity - Optional second catalog level (e.g. "Cervejas").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product subgroup database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_subgroups")]
pub struct Model {
    /// Unique identifier for the subgroup
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent group
    pub group_id: i64,
    /// Subgroup name
    pub name: String,
}

/// Defines relationships between `ProductSubgroup` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subgroup belongs to one group
    #[sea_orm(
        belongs_to = "super::product_group::Entity",
        from = "Column::GroupId",
        to = "super::product_group::Column::Id"
    )]
    Group,
}

impl Related<super::product_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
