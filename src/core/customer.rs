//! Customer business logic - Creating, editing and finding the bar's regulars.

use crate::{
    core::{normalize_name, normalize_optional_text},
    entities::{Comanda, ComandaStatus, Customer, comanda, customer},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Editable customer fields, shared by create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInput {
    /// Display name, required
    pub name: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional notes
    pub notes: Option<String>,
    /// Favorite flag
    pub favorite: bool,
}

impl CustomerInput {
    /// Input with only a name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Creates a customer.
///
/// # Errors
/// Returns `Validation` if the name is blank.
#[instrument(skip(db))]
pub async fn create_customer(
    db: &DatabaseConnection,
    input: CustomerInput,
) -> Result<customer::Model> {
    let name = normalize_name(&input.name, "Customer")?;

    let customer = customer::ActiveModel {
        name: Set(name),
        phone: Set(normalize_optional_text(input.phone)),
        notes: Set(normalize_optional_text(input.notes)),
        favorite: Set(input.favorite),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created customer {} ({})", customer.id, customer.name);
    Ok(customer)
}

/// Retrieves a customer by ID.
pub async fn get_customer_by_id(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<Option<customer::Model>> {
    Customer::find_by_id(customer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all customers alphabetically.
pub async fn list_customers(db: &DatabaseConnection) -> Result<Vec<customer::Model>> {
    Customer::find()
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists favorite customers alphabetically.
pub async fn list_favorite_customers(db: &DatabaseConnection) -> Result<Vec<customer::Model>> {
    Customer::find()
        .filter(customer::Column::Favorite.eq(true))
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds customers whose name contains `term`, ignoring case.
///
/// Case folding covers accented letters, which `SQLite`'s `LIKE` does not.
pub async fn search_customers(
    db: &DatabaseConnection,
    term: &str,
) -> Result<Vec<customer::Model>> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Ok(Vec::new());
    }
    Ok(list_customers(db)
        .await?
        .into_iter()
        .filter(|c| c.name.to_lowercase().contains(&term))
        .collect())
}

/// Replaces the editable fields of a customer.
///
/// # Errors
/// Returns `Validation` for a blank name or `CustomerNotFound`.
#[instrument(skip(db))]
pub async fn update_customer(
    db: &DatabaseConnection,
    customer_id: i64,
    input: CustomerInput,
) -> Result<customer::Model> {
    let name = normalize_name(&input.name, "Customer")?;

    let mut customer: customer::ActiveModel = Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or(Error::CustomerNotFound { id: customer_id })?
        .into();

    customer.name = Set(name);
    customer.phone = Set(normalize_optional_text(input.phone));
    customer.notes = Set(normalize_optional_text(input.notes));
    customer.favorite = Set(input.favorite);

    customer.update(db).await.map_err(Into::into)
}

/// Flips the favorite flag of a customer.
pub async fn toggle_customer_favorite(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<customer::Model> {
    let existing = Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or(Error::CustomerNotFound { id: customer_id })?;
    let favorite = !existing.favorite;

    let mut customer: customer::ActiveModel = existing.into();
    customer.favorite = Set(favorite);
    customer.update(db).await.map_err(Into::into)
}

/// Deletes a customer. Closed comandas keep pointing at the old ID.
///
/// # Errors
/// - `CustomerNotFound` if the customer does not exist
/// - `Validation` if the customer still has an open comanda
#[instrument(skip(db))]
pub async fn delete_customer(db: &DatabaseConnection, customer_id: i64) -> Result<()> {
    let customer = Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or(Error::CustomerNotFound { id: customer_id })?;

    let open_tabs = Comanda::find()
        .filter(comanda::Column::CustomerId.eq(customer_id))
        .filter(comanda::Column::Status.eq(ComandaStatus::Open))
        .count(db)
        .await?;
    if open_tabs > 0 {
        return Err(Error::Validation {
            message: format!("{} still has an open comanda", customer.name),
        });
    }

    customer.delete(db).await?;
    info!("Deleted customer {}", customer_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::comanda::{close_tab, open_tab};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_customer() -> Result<()> {
        let db = setup_test_db().await?;

        let customer = create_customer(
            &db,
            CustomerInput {
                name: "  João da Silva ".to_string(),
                phone: Some("(11) 99999-0000".to_string()),
                notes: Some(String::new()),
                favorite: true,
            },
        )
        .await?;
        assert_eq!(customer.name, "João da Silva");
        assert_eq!(customer.phone.as_deref(), Some("(11) 99999-0000"));
        assert_eq!(customer.notes, None);
        assert!(customer.favorite);

        let blank = create_customer(&db, CustomerInput::named("   ")).await;
        assert!(matches!(blank, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_customer(&db, "Ângela").await?;
        create_test_customer(&db, "Marcos").await?;
        create_test_customer(&db, "Márcia").await?;

        let found = search_customers(&db, "ÂNG").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Ângela");

        let found = search_customers(&db, "mar").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Marcos");

        assert!(search_customers(&db, "  ").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_toggle_favorite() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Zé").await?;

        let updated = update_customer(
            &db,
            customer.id,
            CustomerInput {
                name: "Zé do Bar".to_string(),
                phone: Some("1234".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "Zé do Bar");
        assert_eq!(updated.phone.as_deref(), Some("1234"));

        let toggled = toggle_customer_favorite(&db, customer.id).await?;
        assert!(toggled.favorite);
        assert_eq!(list_favorite_customers(&db).await?.len(), 1);

        let missing = update_customer(&db, 999, CustomerInput::named("x")).await;
        assert!(matches!(missing, Err(Error::CustomerNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_customer_with_open_tab() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();
        let customer = create_test_customer(&db, "Zé").await?;
        let tab = open_tab(&db, &clock, Some(customer.id), None).await?.id();

        let refused = delete_customer(&db, customer.id).await;
        assert!(matches!(refused, Err(Error::Validation { .. })));

        close_tab(&db, &clock, tab).await?;
        delete_customer(&db, customer.id).await?;
        assert!(get_customer_by_id(&db, customer.id).await?.is_none());
        assert!(list_customers(&db).await?.is_empty());
        Ok(())
    }
}
