//! Product group entity - Top-level catalog category (e.g. "Bebidas").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product group database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_groups")]
pub struct Model {
    /// Unique identifier for the group
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group name
    pub name: String,
}

/// Defines relationships between `ProductGroup` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One group has many subgroups
    #[sea_orm(has_many = "super::product_subgroup::Entity")]
    Subgroups,
    /// One group has many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product_subgroup::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subgroups.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
