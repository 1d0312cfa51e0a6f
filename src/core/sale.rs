//! Sale business logic - Records checkout events and their line items.
//!
//! A sale and all of its items are written in one transaction. Each item
//! captures the unit price it was sold at and stores its subtotal, so later
//! catalog repricing never changes what a tab owes.

use std::collections::HashMap;

use crate::{
    core::{clock::Clock, comanda::require_comanda, normalize_optional_text},
    entities::{Product, Sale, SaleItem, comanda, product, sale, sale_item},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// One line of a sale about to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSaleItem {
    /// Product being sold
    pub product_id: i64,
    /// Quantity, must be positive
    pub quantity: Decimal,
    /// Unit price to charge, usually the product's current price
    pub unit_price: Decimal,
}

impl NewSaleItem {
    /// Creates a sale line.
    #[must_use]
    pub const fn new(product_id: i64, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// `quantity * unit_price`
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// A sale as written by [`record_sale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSale {
    /// The sale record
    pub sale: sale::Model,
    /// Its items, in input order
    pub items: Vec<sale_item::Model>,
    /// Sum of the item subtotals, used to drive a follow-up payment
    pub total: Decimal,
}

/// A stored sale with its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleWithItems {
    /// The sale record
    pub sale: sale::Model,
    /// Its items
    pub items: Vec<sale_item::Model>,
}

impl SaleWithItems {
    /// Sum of the stored subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|item| item.subtotal).sum()
    }
}

fn validate_items(items: &[NewSaleItem]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::EmptySale);
    }
    for item in items {
        if item.quantity <= Decimal::ZERO {
            return Err(Error::InvalidQuantity {
                quantity: item.quantity,
            });
        }
        if item.unit_price < Decimal::ZERO {
            return Err(Error::InvalidAmount {
                amount: item.unit_price,
            });
        }
    }
    Ok(())
}

/// Records a sale of one or more items on a comanda.
///
/// Creates the sale and one item per entry in a single transaction. Each
/// item stores `subtotal = quantity * unit_price` at write time. Whether the
/// tab is still open is left to the caller.
///
/// # Arguments
/// * `created_at` - When the sale happened; defaults to `clock.now()` and may
///   be backdated but not set in the future
///
/// # Errors
/// - `EmptySale`, `InvalidQuantity`, `InvalidAmount` for bad items
/// - `InvalidQuantity` for a fractional quantity of a product not sold by fraction
/// - `Validation` for a `created_at` in the future
/// - `ComandaNotFound` / `ProductNotFound` for unknown references
#[instrument(skip(db, clock, items, notes), fields(items = items.len()))]
pub async fn record_sale(
    db: &DatabaseConnection,
    clock: &impl Clock,
    comanda_id: i64,
    items: &[NewSaleItem],
    created_at: Option<DateTime<Utc>>,
    notes: Option<String>,
) -> Result<RecordedSale> {
    validate_items(items)?;

    let now = clock.now();
    let created_at = created_at.unwrap_or(now);
    if created_at > now {
        return Err(Error::Validation {
            message: "Sale date cannot be in the future".to_string(),
        });
    }

    let txn = db.begin().await?;
    require_comanda(&txn, comanda_id).await?;

    let mut products: HashMap<i64, product::Model> = HashMap::new();
    for item in items {
        if !products.contains_key(&item.product_id) {
            let found = Product::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or(Error::ProductNotFound {
                    id: item.product_id,
                })?;
            products.insert(item.product_id, found);
        }
        let sells_fractioned = products
            .get(&item.product_id)
            .is_some_and(|p| p.sells_fractioned);
        if !sells_fractioned && !item.quantity.fract().is_zero() {
            return Err(Error::InvalidQuantity {
                quantity: item.quantity,
            });
        }
    }

    let sale = sale::ActiveModel {
        comanda_id: Set(comanda_id),
        created_at: Set(created_at),
        notes: Set(normalize_optional_text(notes)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut recorded = Vec::with_capacity(items.len());
    for item in items {
        let model = sale_item::ActiveModel {
            sale_id: Set(sale.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            unit_price_at_time: Set(item.unit_price),
            subtotal: Set(item.subtotal()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        recorded.push(model);
    }

    txn.commit().await?;

    let total: Decimal = items.iter().map(NewSaleItem::subtotal).sum();
    info!(
        "Recorded sale {} on comanda {}: {} item(s), total={}",
        sale.id,
        comanda_id,
        recorded.len(),
        total
    );
    Ok(RecordedSale {
        sale,
        items: recorded,
        total,
    })
}

/// Lists the sales of a comanda, newest first, each with its items.
pub async fn list_sales(db: &DatabaseConnection, comanda_id: i64) -> Result<Vec<SaleWithItems>> {
    let txn = db.begin().await?;
    let sales = Sale::find()
        .filter(sale::Column::ComandaId.eq(comanda_id))
        .order_by_desc(sale::Column::CreatedAt)
        .order_by_desc(sale::Column::Id)
        .all(&txn)
        .await?;

    let items = if sales.is_empty() {
        Vec::new()
    } else {
        SaleItem::find()
            .filter(sale_item::Column::SaleId.is_in(sales.iter().map(|s| s.id)))
            .order_by_asc(sale_item::Column::Id)
            .all(&txn)
            .await?
    };
    txn.commit().await?;

    let mut by_sale: HashMap<i64, Vec<sale_item::Model>> = HashMap::new();
    for item in items {
        by_sale.entry(item.sale_id).or_default().push(item);
    }

    debug!("Fetched {} sale(s) for comanda {}", sales.len(), comanda_id);
    Ok(sales
        .into_iter()
        .map(|sale| {
            let items = by_sale.remove(&sale.id).unwrap_or_default();
            SaleWithItems { sale, items }
        })
        .collect())
}

/// Deletes a sale together with its items.
///
/// This is how a sale is corrected: delete it and record it again. Sales on
/// a closed comanda are frozen.
///
/// # Errors
/// - `SaleNotFound` if the sale does not exist
/// - `ComandaClosed` if its comanda is closed
#[instrument(skip(db))]
pub async fn delete_sale(db: &DatabaseConnection, sale_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let sale = Sale::find_by_id(sale_id)
        .one(&txn)
        .await?
        .ok_or(Error::SaleNotFound { id: sale_id })?;
    let tab: comanda::Model = require_comanda(&txn, sale.comanda_id).await?;
    if !tab.is_open() {
        return Err(Error::ComandaClosed { id: tab.id });
    }

    let removed = SaleItem::delete_many()
        .filter(sale_item::Column::SaleId.eq(sale_id))
        .exec(&txn)
        .await?;
    sale.delete(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted sale {} and {} item(s) from comanda {}",
        sale_id, removed.rows_affected, tab.id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        catalog::{delete_product, update_product_price},
        comanda::{close_tab, compute_totals},
        payment::record_payment,
    };
    use crate::entities::PaymentMethod;
    use crate::test_utils::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use sea_orm::{ConnectionTrait, PaginatorTrait};

    #[tokio::test]
    async fn test_record_sale_captures_prices() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;
        let chips = create_test_product(&db, "Batata Chips", dec!(7.50)).await?;

        let recorded = record_sale(
            &db,
            &clock,
            tab.id,
            &[
                NewSaleItem::new(beer.id, dec!(3), dec!(6.50)),
                NewSaleItem::new(chips.id, dec!(1), dec!(7.50)),
            ],
            None,
            Some("  mesa 4 ".to_string()),
        )
        .await?;

        assert_eq!(recorded.total, dec!(27.00));
        assert_eq!(recorded.items.len(), 2);
        assert_eq!(recorded.items[0].subtotal, dec!(19.50));
        assert_eq!(recorded.items[0].unit_price_at_time, dec!(6.50));
        assert_eq!(recorded.items[1].subtotal, dec!(7.50));
        assert_eq!(recorded.sale.created_at, clock.now());
        assert_eq!(recorded.sale.notes.as_deref(), Some("mesa 4"));
        Ok(())
    }

    #[tokio::test]
    async fn test_price_change_does_not_rewrite_history() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;

        record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(2), dec!(6.50))],
            None,
            None,
        )
        .await?;

        update_product_price(&db, beer.id, dec!(8.00)).await?;
        let sales = list_sales(&db, tab.id).await?;
        assert_eq!(sales[0].items[0].subtotal, dec!(13.00));
        assert_eq!(sales[0].items[0].unit_price_at_time, dec!(6.50));
        assert_eq!(compute_totals(&db, tab.id).await?.total_consumption, dec!(13.00));

        // Hard-deleting the product keeps the historical item too
        delete_product(&db, beer.id).await?;
        assert_eq!(compute_totals(&db, tab.id).await?.total_consumption, dec!(13.00));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_sale_validation() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;

        let result = record_sale(&db, &clock, tab.id, &[], None, None).await;
        assert!(matches!(result, Err(Error::EmptySale)));

        let result = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(0), dec!(6.50))],
            None,
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidQuantity { .. })));

        let result = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(1), dec!(-1))],
            None,
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        let result = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(1), dec!(6.50))],
            Some(clock.now() + Duration::hours(1)),
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        // Nothing was written by any refused call
        assert_eq!(Sale::find().count(&db).await?, 0);
        assert_eq!(SaleItem::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_sale_rejects_unknown_references() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;

        let result = record_sale(
            &db,
            &clock,
            tab.id,
            &[
                NewSaleItem::new(beer.id, dec!(1), dec!(6.50)),
                NewSaleItem::new(9_999, dec!(1), dec!(1.00)),
            ],
            None,
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 9_999 })));
        assert_eq!(Sale::find().count(&db).await?, 0);
        assert_eq!(SaleItem::find().count(&db).await?, 0);

        let result = record_sale(
            &db,
            &clock,
            12_345,
            &[NewSaleItem::new(beer.id, dec!(1), dec!(6.50))],
            None,
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::ComandaNotFound { id: 12_345 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_sale_is_all_or_nothing() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;

        // Fail the second item insert, after the sale row and first item exist
        db.execute_unprepared(
            "CREATE TRIGGER reject_quantity_13 BEFORE INSERT ON sale_items \
             WHEN CAST(NEW.quantity AS REAL) = 13 BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .await?;

        let result = record_sale(
            &db,
            &clock,
            tab.id,
            &[
                NewSaleItem::new(beer.id, dec!(1), dec!(6.50)),
                NewSaleItem::new(beer.id, dec!(13), dec!(6.50)),
            ],
            None,
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(Sale::find().count(&db).await?, 0);
        assert_eq!(SaleItem::find().count(&db).await?, 0);
        assert_eq!(compute_totals(&db, tab.id).await?.total_consumption, dec!(0));

        // The same tab still takes a clean sale afterwards
        record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(2), dec!(6.50))],
            None,
            None,
        )
        .await?;
        assert_eq!(Sale::find().count(&db).await?, 1);
        assert_eq!(SaleItem::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_fractional_quantities() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;
        let peanuts = create_fractioned_product(&db, "Amendoim (kg)", dec!(40.00)).await?;

        let result = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(1.5), dec!(6.50))],
            None,
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidQuantity { .. })));

        let recorded = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(peanuts.id, dec!(0.25), dec!(40.00))],
            None,
            None,
        )
        .await?;
        assert_eq!(recorded.total, dec!(10.00));
        Ok(())
    }

    #[tokio::test]
    async fn test_backdated_sale() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;
        let yesterday = clock.now() - Duration::days(1);

        let recorded = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(1), dec!(6.50))],
            Some(yesterday),
            None,
        )
        .await?;
        assert_eq!(recorded.sale.created_at, yesterday);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_delete_sales() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;

        let older = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(1), dec!(6.50))],
            Some(clock.now() - Duration::minutes(30)),
            None,
        )
        .await?;
        let newer = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(2), dec!(6.50))],
            None,
            None,
        )
        .await?;

        let sales = list_sales(&db, tab.id).await?;
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].sale.id, newer.sale.id);
        assert_eq!(sales[0].total(), dec!(13.00));
        assert_eq!(sales[1].sale.id, older.sale.id);

        delete_sale(&db, newer.sale.id).await?;
        let sales = list_sales(&db, tab.id).await?;
        assert_eq!(sales.len(), 1);
        assert_eq!(SaleItem::find().count(&db).await?, 1);
        assert_eq!(compute_totals(&db, tab.id).await?.total_consumption, dec!(6.50));

        let missing = delete_sale(&db, newer.sale.id).await;
        assert!(matches!(missing, Err(Error::SaleNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_sales_on_closed_tab_are_frozen() -> Result<()> {
        let (db, _customer, tab) = setup_with_customer_tab().await?;
        let clock = test_clock();
        let beer = create_test_product(&db, "Cerveja Lata", dec!(6.50)).await?;

        let recorded = record_sale(
            &db,
            &clock,
            tab.id,
            &[NewSaleItem::new(beer.id, dec!(1), dec!(6.50))],
            None,
            None,
        )
        .await?;
        record_payment(&db, &clock, tab.id, PaymentMethod::Pix, dec!(6.50), None).await?;
        close_tab(&db, &clock, tab.id).await?;

        let result = delete_sale(&db, recorded.sale.id).await;
        assert!(matches!(result, Err(Error::ComandaClosed { .. })));
        Ok(())
    }
}
