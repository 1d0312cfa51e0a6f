//! Payment entity - A settlement applied against a comanda's balance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a payment was made
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Brazilian instant transfer
    #[sea_orm(string_value = "PIX")]
    Pix,
    /// Cash
    #[sea_orm(string_value = "CASH")]
    Cash,
    /// Debit or credit card
    #[sea_orm(string_value = "CARD")]
    Card,
}

/// Payment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Comanda being paid
    pub comanda_id: i64,
    /// When the payment was received
    pub created_at: DateTimeUtc,
    /// Payment method
    pub method: PaymentMethod,
    /// Amount received, always positive
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// Optional notes
    pub notes: Option<String>,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one comanda
    #[sea_orm(
        belongs_to = "super::comanda::Entity",
        from = "Column::ComandaId",
        to = "super::comanda::Column::Id"
    )]
    Comanda,
}

impl Related<super::comanda::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comanda.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
