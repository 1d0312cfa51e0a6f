//! Product entity - A catalog item with its current unit price.
//!
//! The price stored here is only the default offered at sale time. Sale items
//! capture their own `unit_price_at_time`, so repricing or deleting a product
//! never rewrites history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown on the sale screen (e.g., "Cerveja Lata")
    pub name: String,
    /// Catalog group (category)
    pub group_id: i64,
    /// Optional catalog subgroup
    pub subgroup_id: Option<i64>,
    /// Current unit price, never negative
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_price: Decimal,
    /// Whether the product may be sold in fractional quantities (by weight, by dose)
    pub sells_fractioned: bool,
    /// Inactive products stay in the catalog but are hidden from the sale screen
    pub active: bool,
    /// Pinned to the quick-sale grid
    pub favorite: bool,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one group
    #[sea_orm(
        belongs_to = "super::product_group::Entity",
        from = "Column::GroupId",
        to = "super::product_group::Column::Id"
    )]
    Group,
    /// A product may belong to one subgroup
    #[sea_orm(
        belongs_to = "super::product_subgroup::Entity",
        from = "Column::SubgroupId",
        to = "super::product_subgroup::Column::Id"
    )]
    Subgroup,
}

impl Related<super::product_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::product_subgroup::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subgroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
