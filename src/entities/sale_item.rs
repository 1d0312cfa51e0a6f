//! Sale item entity - One product line of a sale.
//!
//! `unit_price_at_time` and `subtotal` are captured when the sale is recorded
//! and never recomputed from the live product price. `product_id` is a plain
//! reference with no foreign key: products can be hard-deleted while their
//! historical items remain.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning sale
    pub sale_id: i64,
    /// Product sold
    pub product_id: i64,
    /// Quantity sold, always positive
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity: Decimal,
    /// Unit price captured at sale time
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub unit_price_at_time: Decimal,
    /// `quantity * unit_price_at_time`, stored at write time
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub subtotal: Decimal,
}

/// Defines relationships between `SaleItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one sale
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
