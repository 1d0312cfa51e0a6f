//! Sale entity - One checkout event within a comanda, grouping its items.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Comanda this sale was charged to
    pub comanda_id: i64,
    /// When the sale happened (may be backdated, never in the future)
    pub created_at: DateTimeUtc,
    /// Optional notes
    pub notes: Option<String>,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale belongs to one comanda
    #[sea_orm(
        belongs_to = "super::comanda::Entity",
        from = "Column::ComandaId",
        to = "super::comanda::Column::Id"
    )]
    Comanda,
    /// One sale has many items
    #[sea_orm(has_many = "super::sale_item::Entity")]
    Items,
}

impl Related<super::comanda::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comanda.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
