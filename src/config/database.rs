//! Database configuration module for Caderninho.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. The secondary indexes cover the lookups the ledger runs on every
//! call: tabs by status and customer, sales and payments by tab, items by sale.

use crate::entities::{
    Comanda, ComandaColumn, Customer, Payment, PaymentColumn, Product, ProductGroup,
    ProductSubgroup, Sale, SaleColumn, SaleItem, SaleItemColumn,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Default connection string when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://caderninho.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file created on first use.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Partial unique index backing the one-open-tab-per-customer rule. Walk-up
/// tabs have a NULL `customer_id` and never collide.
const ONE_OPEN_TAB_PER_CUSTOMER: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
    idx_comandas_one_open_per_customer ON comandas (customer_id) WHERE status = 'OPEN'";

fn secondary_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .if_not_exists()
            .name("idx_comandas_status_customer")
            .table(Comanda)
            .col(ComandaColumn::Status)
            .col(ComandaColumn::CustomerId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_sales_comanda")
            .table(Sale)
            .col(SaleColumn::ComandaId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_sale_items_sale")
            .table(SaleItem)
            .col(SaleItemColumn::SaleId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_payments_comanda")
            .table(Payment)
            .col(PaymentColumn::ComandaId)
            .to_owned(),
    ]
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Parents are created before children so the foreign keys generated from the
/// entity relations resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, ProductGroup).await?;
    create_table(db, &schema, ProductSubgroup).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Customer).await?;
    create_table(db, &schema, Comanda).await?;
    create_table(db, &schema, Sale).await?;
    create_table(db, &schema, SaleItem).await?;
    create_table(db, &schema, Payment).await?;

    for index in secondary_indexes() {
        db.execute(builder.build(&index)).await?;
    }
    db.execute_unprepared(ONE_OPEN_TAB_PER_CUSTOMER).await?;

    info!("Database tables ensured.");
    Ok(())
}
