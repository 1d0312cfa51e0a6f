//! Catalog business logic - Product groups, subgroups and products.
//!
//! Products are hard-deleted: sale items keep the price they were sold at, so
//! nothing downstream needs the product row to survive. The catalog is seeded
//! from [`CatalogConfig`] the first time the register starts.

use std::collections::HashMap;

use crate::{
    config::catalog::CatalogConfig,
    core::normalize_name,
    entities::{Product, ProductGroup, ProductSubgroup, product, product_group, product_subgroup},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Editable product fields, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    /// Product name, required
    pub name: String,
    /// Group (category) the product belongs to
    pub group_id: i64,
    /// Optional subgroup, must belong to `group_id`
    pub subgroup_id: Option<i64>,
    /// Unit price, never negative
    pub unit_price: Decimal,
    /// Sold by fraction
    pub sells_fractioned: bool,
    /// Shown on the sale screen
    pub active: bool,
}

impl ProductInput {
    /// An active product sold by whole units.
    #[must_use]
    pub fn new(name: impl Into<String>, group_id: i64, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            group_id,
            subgroup_id: None,
            unit_price,
            sells_fractioned: false,
            active: true,
        }
    }
}

/// Creates a product group.
pub async fn create_group(db: &DatabaseConnection, name: &str) -> Result<product_group::Model> {
    let name = normalize_name(name, "Group")?;
    product_group::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists product groups alphabetically.
pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<product_group::Model>> {
    ProductGroup::find()
        .order_by_asc(product_group::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a subgroup under an existing group.
///
/// # Errors
/// Returns `GroupNotFound` if the parent group does not exist.
pub async fn create_subgroup(
    db: &DatabaseConnection,
    group_id: i64,
    name: &str,
) -> Result<product_subgroup::Model> {
    let name = normalize_name(name, "Subgroup")?;
    ProductGroup::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: group_id })?;

    product_subgroup::ActiveModel {
        group_id: Set(group_id),
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists the subgroups of a group alphabetically.
pub async fn list_subgroups(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<Vec<product_subgroup::Model>> {
    ProductSubgroup::find()
        .filter(product_subgroup::Column::GroupId.eq(group_id))
        .order_by_asc(product_subgroup::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

fn validate_price(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(())
}

/// Checks the name, price and group references of a product input.
async fn validate_product_input<C>(db: &C, input: &ProductInput) -> Result<String>
where
    C: ConnectionTrait,
{
    let name = normalize_name(&input.name, "Product")?;
    validate_price(input.unit_price)?;

    ProductGroup::find_by_id(input.group_id)
        .one(db)
        .await?
        .ok_or(Error::GroupNotFound { id: input.group_id })?;

    if let Some(subgroup_id) = input.subgroup_id {
        let subgroup = ProductSubgroup::find_by_id(subgroup_id)
            .one(db)
            .await?
            .ok_or(Error::GroupNotFound { id: subgroup_id })?;
        if subgroup.group_id != input.group_id {
            return Err(Error::Validation {
                message: format!(
                    "Subgroup '{}' does not belong to group {}",
                    subgroup.name, input.group_id
                ),
            });
        }
    }

    Ok(name)
}

/// Creates a product.
///
/// # Errors
/// Returns an error if:
/// - The name is blank (`Validation`)
/// - The price is negative (`InvalidAmount`)
/// - The group or subgroup does not exist (`GroupNotFound`), or the subgroup
///   belongs to another group (`Validation`)
#[instrument(skip(db))]
pub async fn create_product(db: &DatabaseConnection, input: ProductInput) -> Result<product::Model> {
    let name = validate_product_input(db, &input).await?;

    let product = product::ActiveModel {
        name: Set(name),
        group_id: Set(input.group_id),
        subgroup_id: Set(input.subgroup_id),
        unit_price: Set(input.unit_price),
        sells_fractioned: Set(input.sells_fractioned),
        active: Set(input.active),
        favorite: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Created product {} ({}) at {}",
        product.id, product.name, product.unit_price
    );
    Ok(product)
}

/// Replaces the editable fields of a product. The favorite flag is kept.
///
/// # Errors
/// Same as [`create_product`], plus `ProductNotFound`.
#[instrument(skip(db))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    input: ProductInput,
) -> Result<product::Model> {
    let name = validate_product_input(db, &input).await?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.name = Set(name);
    product.group_id = Set(input.group_id);
    product.subgroup_id = Set(input.subgroup_id);
    product.unit_price = Set(input.unit_price);
    product.sells_fractioned = Set(input.sells_fractioned);
    product.active = Set(input.active);

    product.update(db).await.map_err(Into::into)
}

/// Changes only the unit price of a product.
///
/// Already-recorded sale items keep their captured price.
#[instrument(skip(db))]
pub async fn update_product_price(
    db: &DatabaseConnection,
    product_id: i64,
    new_price: Decimal,
) -> Result<product::Model> {
    validate_price(new_price)?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();
    product.unit_price = Set(new_price);

    let updated = product.update(db).await?;
    info!("Updated price for product {}: {}", product_id, new_price);
    Ok(updated)
}

/// Flips the favorite flag of a product.
pub async fn toggle_product_favorite(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<product::Model> {
    let existing = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;
    let favorite = !existing.favorite;

    let mut product: product::ActiveModel = existing.into();
    product.favorite = Set(favorite);
    product.update(db).await.map_err(Into::into)
}

/// Hard-deletes a product.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;
    product.delete(db).await?;
    info!("Deleted product {}", product_id);
    Ok(())
}

/// Retrieves a product by ID.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every product alphabetically.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the products offered on the sale screen, alphabetically.
pub async fn list_active_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::Active.eq(true))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists favorite products alphabetically.
pub async fn list_favorite_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::Favorite.eq(true))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Seeds groups, subgroups and products when the catalog is empty.
///
/// Groups and subgroups that already exist by name are reused. Products are
/// only inserted while the products table is empty, so restarting never
/// duplicates the catalog. Returns the number of products inserted.
#[instrument(skip(db, config))]
pub async fn seed_catalog(db: &DatabaseConnection, config: &CatalogConfig) -> Result<usize> {
    let txn = db.begin().await?;

    if Product::find().count(&txn).await? > 0 {
        debug!("Catalog already populated, skipping seed");
        return Ok(0);
    }

    let mut group_ids: HashMap<String, i64> = ProductGroup::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|g| (g.name, g.id))
        .collect();
    let mut subgroup_ids: HashMap<(i64, String), i64> = ProductSubgroup::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| ((s.group_id, s.name), s.id))
        .collect();

    for group in &config.groups {
        let group_id = if let Some(id) = group_ids.get(&group.name) {
            *id
        } else {
            let created = product_group::ActiveModel {
                name: Set(group.name.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            group_ids.insert(group.name.clone(), created.id);
            created.id
        };

        for subgroup in &group.subgroups {
            let key = (group_id, subgroup.clone());
            if !subgroup_ids.contains_key(&key) {
                let created = product_subgroup::ActiveModel {
                    group_id: Set(group_id),
                    name: Set(subgroup.clone()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                subgroup_ids.insert(key, created.id);
            }
        }
    }

    let mut inserted = 0;
    for seed in &config.products {
        let group_id = *group_ids.get(&seed.group).ok_or_else(|| Error::Config {
            message: format!("Unknown group '{}' in catalog", seed.group),
        })?;
        let subgroup_id = seed
            .subgroup
            .as_ref()
            .and_then(|name| subgroup_ids.get(&(group_id, name.clone())).copied());

        product::ActiveModel {
            name: Set(seed.name.clone()),
            group_id: Set(group_id),
            subgroup_id: Set(subgroup_id),
            unit_price: Set(seed.unit_price),
            sells_fractioned: Set(seed.sells_fractioned),
            active: Set(seed.active),
            favorite: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        inserted += 1;
    }

    txn.commit().await?;
    info!(
        "Seeded catalog: {} group(s), {} product(s)",
        group_ids.len(),
        inserted
    );
    Ok(inserted)
}
