//! Shared test utilities for the comanda ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.
#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        catalog::{self, ProductInput},
        clock::FixedClock,
        comanda,
        customer::{self, CustomerInput},
    },
    entities::{self, ProductGroup, product_group},
    errors::Result,
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing_subscriber::EnvFilter;

/// Group that [`create_test_product`] files products under.
pub const TEST_GROUP: &str = "Geral";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes tracing output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A clock frozen on a Friday evening, 2025-03-14 21:30 UTC.
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2025, 3, 14, 21, 30, 0).unwrap())
}

/// Creates a test customer with only a name.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::customer::Model> {
    customer::create_customer(db, CustomerInput::named(name)).await
}

/// Returns the group called `name`, creating it on first use.
pub async fn create_test_group(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product_group::Model> {
    let existing = ProductGroup::find()
        .filter(product_group::Column::Name.eq(name))
        .one(db)
        .await?;
    match existing {
        Some(group) => Ok(group),
        None => catalog::create_group(db, name).await,
    }
}

/// Creates an active product sold by whole units.
///
/// # Defaults
/// * group: [`TEST_GROUP`]
/// * `sells_fractioned`: false
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    unit_price: Decimal,
) -> Result<entities::product::Model> {
    let group = create_test_group(db, TEST_GROUP).await?;
    catalog::create_product(db, ProductInput::new(name, group.id, unit_price)).await
}

/// Creates an active product that may be sold by fraction (weight, dose).
pub async fn create_fractioned_product(
    db: &DatabaseConnection,
    name: &str,
    unit_price: Decimal,
) -> Result<entities::product::Model> {
    let group = create_test_group(db, TEST_GROUP).await?;
    catalog::create_product(
        db,
        ProductInput {
            sells_fractioned: true,
            ..ProductInput::new(name, group.id, unit_price)
        },
    )
    .await
}

/// Sets up a database with one customer and an open comanda for them.
/// Returns (db, customer, comanda) for ledger tests.
pub async fn setup_with_customer_tab() -> Result<(
    DatabaseConnection,
    entities::customer::Model,
    entities::comanda::Model,
)> {
    let db = setup_test_db().await?;
    let customer = create_test_customer(&db, "Zé do Bar").await?;
    let tab = comanda::open_tab(&db, &test_clock(), Some(customer.id), None)
        .await?
        .into_model();
    Ok((db, customer, tab))
}
