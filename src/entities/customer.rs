//! Customer entity - A regular of the bar who can hold a named comanda.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, always trimmed and non-empty
    pub name: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Free-form notes kept by the staff
    pub notes: Option<String>,
    /// Pinned to the top of the quick-access lists
    pub favorite: bool,
}

/// Comandas reference customers by ID only, so deleting a customer keeps
/// its historical tabs intact.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
