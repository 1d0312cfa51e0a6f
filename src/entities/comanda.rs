//! Comanda entity - A running tab that accumulates sales and payments.
//!
//! A comanda belongs to at most one customer (`customer_id` is `None` for a
//! walk-up tab) and only ever moves from `OPEN` to `CLOSED`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a comanda
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComandaStatus {
    /// Accepting sales and payments
    #[sea_orm(string_value = "OPEN")]
    Open,
    /// Settled and frozen
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// Comanda database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comandas")]
pub struct Model {
    /// Unique identifier for the comanda
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning customer, `None` for a walk-up tab
    pub customer_id: Option<i64>,
    /// When the tab was opened
    pub opened_at: DateTimeUtc,
    /// When the tab was closed, `None` while open
    pub closed_at: Option<DateTimeUtc>,
    /// Current lifecycle state
    pub status: ComandaStatus,
    /// Optional notes (e.g., "Venda avulsa")
    pub notes: Option<String>,
}

impl Model {
    /// Whether the comanda still accepts a close.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == ComandaStatus::Open
    }
}

/// Defines relationships between Comanda and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One comanda has many sales
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
    /// One comanda has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
