//! Comanda ledger - Tab lifecycle and balance derivation.
//!
//! A comanda's financial state is never stored. [`compute_totals`] derives it
//! from the sale items and payments each time it is asked, inside a single
//! read transaction so the three figures always come from the same snapshot.
//! Closing is gated on that derived balance: a tab closes only once its
//! consumption is covered (`balance <= 0`), and a closed tab never reopens.

use std::collections::HashMap;

use crate::{
    core::{clock::Clock, normalize_optional_text},
    entities::{
        Comanda, ComandaStatus, Customer, Payment, Sale, SaleItem, comanda, payment, sale,
        sale_item,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Financial state of a comanda, derived from its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TabTotals {
    /// Sum of the subtotals of every sale item on the tab
    pub total_consumption: Decimal,
    /// Sum of every payment on the tab
    pub total_paid: Decimal,
    /// `total_consumption - total_paid`; negative when overpaid
    pub balance: Decimal,
}

impl TabTotals {
    /// Builds totals from the two sums, deriving the balance.
    #[must_use]
    pub fn new(total_consumption: Decimal, total_paid: Decimal) -> Self {
        Self {
            total_consumption,
            total_paid,
            balance: total_consumption - total_paid,
        }
    }

    /// Whether consumption is fully covered and the tab may close.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.balance <= Decimal::ZERO
    }
}

/// Result of [`open_tab`]: a fresh tab, or the one already open for the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabOpening {
    /// A new comanda was inserted
    Created(comanda::Model),
    /// The customer already had an open comanda; nothing was written
    Existing(comanda::Model),
}

impl TabOpening {
    /// ID of the tab the caller should continue with.
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Created(tab) | Self::Existing(tab) => tab.id,
        }
    }

    /// Whether a new tab was created.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// The tab model, whichever way it was obtained.
    #[must_use]
    pub fn into_model(self) -> comanda::Model {
        match self {
            Self::Created(tab) | Self::Existing(tab) => tab,
        }
    }
}

/// A comanda paired with its derived totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabWithTotals {
    /// The comanda record
    pub comanda: comanda::Model,
    /// Its totals at the time of the read
    pub totals: TabTotals,
}

/// Sums sale items and payments for a set of comandas on an existing connection
/// or transaction. Tabs without records are absent from the map.
pub(crate) async fn totals_for_tabs<C>(db: &C, comanda_ids: &[i64]) -> Result<HashMap<i64, TabTotals>>
where
    C: ConnectionTrait,
{
    if comanda_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sales: Vec<sale::Model> = Sale::find()
        .filter(sale::Column::ComandaId.is_in(comanda_ids.iter().copied()))
        .all(db)
        .await?;
    let tab_of_sale: HashMap<i64, i64> = sales.iter().map(|s| (s.id, s.comanda_id)).collect();

    let items: Vec<sale_item::Model> = if tab_of_sale.is_empty() {
        Vec::new()
    } else {
        SaleItem::find()
            .filter(sale_item::Column::SaleId.is_in(tab_of_sale.keys().copied()))
            .all(db)
            .await?
    };

    let payments: Vec<payment::Model> = Payment::find()
        .filter(payment::Column::ComandaId.is_in(comanda_ids.iter().copied()))
        .all(db)
        .await?;

    let mut sums: HashMap<i64, (Decimal, Decimal)> = HashMap::new();
    for item in &items {
        if let Some(tab_id) = tab_of_sale.get(&item.sale_id) {
            sums.entry(*tab_id).or_default().0 += item.subtotal;
        }
    }
    for payment in &payments {
        sums.entry(payment.comanda_id).or_default().1 += payment.amount;
    }

    Ok(sums
        .into_iter()
        .map(|(tab_id, (consumption, paid))| (tab_id, TabTotals::new(consumption, paid)))
        .collect())
}

/// Totals of one comanda on an existing connection or transaction.
pub(crate) async fn totals_in<C>(db: &C, comanda_id: i64) -> Result<TabTotals>
where
    C: ConnectionTrait,
{
    let mut totals = totals_for_tabs(db, &[comanda_id]).await?;
    Ok(totals.remove(&comanda_id).unwrap_or_default())
}

/// Finds a comanda by ID or fails with `ComandaNotFound`.
pub(crate) async fn require_comanda<C>(db: &C, comanda_id: i64) -> Result<comanda::Model>
where
    C: ConnectionTrait,
{
    Comanda::find_by_id(comanda_id)
        .one(db)
        .await?
        .ok_or(Error::ComandaNotFound { id: comanda_id })
}

/// Flips an open comanda to CLOSED, stamping `closed_at`. Callers check the guard.
pub(crate) async fn mark_closed<C>(
    db: &C,
    clock: &impl Clock,
    tab: comanda::Model,
) -> Result<comanda::Model>
where
    C: ConnectionTrait,
{
    let mut active: comanda::ActiveModel = tab.into();
    active.status = Set(ComandaStatus::Closed);
    active.closed_at = Set(Some(clock.now()));
    active.update(db).await.map_err(Into::into)
}

/// Derives the financial state of a comanda.
///
/// Reads every sale item of every sale on the tab and every payment on the
/// tab in one transaction, and returns `(total_consumption, total_paid,
/// balance)`. A tab without records yields zeros.
///
/// Unlike the mutating operations, an ID with no tab is not an error: it also
/// yields zeros. Callers that need to tell a missing tab from an empty one
/// must look it up with [`get_comanda_by_id`] first.
#[instrument(skip(db))]
pub async fn compute_totals(db: &DatabaseConnection, comanda_id: i64) -> Result<TabTotals> {
    let txn = db.begin().await?;
    let totals = totals_in(&txn, comanda_id).await?;
    txn.commit().await?;

    debug!(
        "Totals for comanda {}: consumption={}, paid={}, balance={}",
        comanda_id, totals.total_consumption, totals.total_paid, totals.balance
    );
    Ok(totals)
}

/// Opens a tab for a customer, or a walk-up tab when `customer_id` is `None`.
///
/// A customer holds at most one open tab: if one exists it is returned as
/// [`TabOpening::Existing`] and nothing is written. Walk-up tabs are exempt,
/// any number of them may be open at once. The check runs inside the write
/// transaction, and the `idx_comandas_one_open_per_customer` unique index
/// rejects a second open tab that slips past it.
///
/// # Errors
/// Returns `CustomerNotFound` if `customer_id` names no customer, or a
/// database error.
#[instrument(skip(db, clock, notes))]
pub async fn open_tab(
    db: &DatabaseConnection,
    clock: &impl Clock,
    customer_id: Option<i64>,
    notes: Option<String>,
) -> Result<TabOpening> {
    let txn = db.begin().await?;

    if let Some(customer_id) = customer_id {
        Customer::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or(Error::CustomerNotFound { id: customer_id })?;

        let existing = Comanda::find()
            .filter(comanda::Column::Status.eq(ComandaStatus::Open))
            .filter(comanda::Column::CustomerId.eq(customer_id))
            .one(&txn)
            .await?;
        if let Some(tab) = existing {
            txn.commit().await?;
            info!(
                "Customer {} already has open comanda {}, reusing it",
                customer_id, tab.id
            );
            return Ok(TabOpening::Existing(tab));
        }
    }

    let tab = comanda::ActiveModel {
        customer_id: Set(customer_id),
        opened_at: Set(clock.now()),
        closed_at: Set(None),
        status: Set(ComandaStatus::Open),
        notes: Set(normalize_optional_text(notes)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Opened comanda {} for customer {:?}", tab.id, customer_id);
    Ok(TabOpening::Created(tab))
}

/// Closes a comanda whose consumption is covered by its payments.
///
/// The balance is derived in the same transaction as the update. Overpaid
/// tabs (`balance < 0`) close normally and no credit record is produced.
///
/// # Errors
/// - `ComandaNotFound` if the tab does not exist
/// - `ComandaClosed` if it is already closed
/// - `OutstandingBalance` if `balance > 0`; the tab stays open
#[instrument(skip(db, clock))]
pub async fn close_tab(
    db: &DatabaseConnection,
    clock: &impl Clock,
    comanda_id: i64,
) -> Result<comanda::Model> {
    let txn = db.begin().await?;

    let tab = require_comanda(&txn, comanda_id).await?;
    if !tab.is_open() {
        return Err(Error::ComandaClosed { id: comanda_id });
    }

    let totals = totals_in(&txn, comanda_id).await?;
    if !totals.is_settled() {
        warn!(
            "Refusing to close comanda {} with balance {}",
            comanda_id, totals.balance
        );
        return Err(Error::OutstandingBalance {
            balance: totals.balance,
        });
    }

    let closed = mark_closed(&txn, clock, tab).await?;
    txn.commit().await?;

    info!(
        "Closed comanda {} (consumption={}, paid={})",
        comanda_id, totals.total_consumption, totals.total_paid
    );
    Ok(closed)
}

/// Retrieves a comanda by ID.
pub async fn get_comanda_by_id(
    db: &DatabaseConnection,
    comanda_id: i64,
) -> Result<Option<comanda::Model>> {
    Comanda::find_by_id(comanda_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the open comanda of a customer, if any.
pub async fn find_open_tab_for_customer(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<Option<comanda::Model>> {
    Comanda::find()
        .filter(comanda::Column::Status.eq(ComandaStatus::Open))
        .filter(comanda::Column::CustomerId.eq(customer_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn attach_totals<C>(db: &C, tabs: Vec<comanda::Model>) -> Result<Vec<TabWithTotals>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i64> = tabs.iter().map(|t| t.id).collect();
    let totals = totals_for_tabs(db, &ids).await?;
    Ok(tabs
        .into_iter()
        .map(|comanda| {
            let totals = totals.get(&comanda.id).copied().unwrap_or_default();
            TabWithTotals { comanda, totals }
        })
        .collect())
}

/// Lists every comanda, newest first, with its totals from one snapshot.
pub async fn list_tabs_with_totals(db: &DatabaseConnection) -> Result<Vec<TabWithTotals>> {
    let txn = db.begin().await?;
    let tabs = Comanda::find()
        .order_by_desc(comanda::Column::OpenedAt)
        .order_by_desc(comanda::Column::Id)
        .all(&txn)
        .await?;
    let result = attach_totals(&txn, tabs).await?;
    txn.commit().await?;
    Ok(result)
}

/// Lists the open comandas that belong to a customer, newest first, with totals.
///
/// Walk-up tabs are left out: they are settled on the spot by the quick-sale flow.
pub async fn list_open_customer_tabs(db: &DatabaseConnection) -> Result<Vec<TabWithTotals>> {
    let txn = db.begin().await?;
    let tabs = Comanda::find()
        .filter(comanda::Column::Status.eq(ComandaStatus::Open))
        .filter(comanda::Column::CustomerId.is_not_null())
        .order_by_desc(comanda::Column::OpenedAt)
        .order_by_desc(comanda::Column::Id)
        .all(&txn)
        .await?;
    let result = attach_totals(&txn, tabs).await?;
    txn.commit().await?;
    Ok(result)
}

/// Deletes an open walk-up comanda that never received a sale or payment.
///
/// This backs out a quick sale cancelled before anything was recorded.
///
/// # Errors
/// - `ComandaNotFound` if the tab does not exist
/// - `ComandaClosed` if it is closed
/// - `Validation` if it belongs to a customer or already has records
#[instrument(skip(db))]
pub async fn discard_empty_tab(db: &DatabaseConnection, comanda_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let tab = require_comanda(&txn, comanda_id).await?;
    if tab.customer_id.is_some() {
        return Err(Error::Validation {
            message: "Only walk-up comandas can be discarded".to_string(),
        });
    }
    if !tab.is_open() {
        return Err(Error::ComandaClosed { id: comanda_id });
    }

    let sales = Sale::find()
        .filter(sale::Column::ComandaId.eq(comanda_id))
        .count(&txn)
        .await?;
    let payments = Payment::find()
        .filter(payment::Column::ComandaId.eq(comanda_id))
        .count(&txn)
        .await?;
    if sales > 0 || payments > 0 {
        return Err(Error::Validation {
            message: format!(
                "Comanda {comanda_id} has {sales} sale(s) and {payments} payment(s) and cannot be discarded"
            ),
        });
    }

    tab.delete(&txn).await?;
    txn.commit().await?;

    info!("Discarded empty walk-up comanda {}", comanda_id);
    Ok(())
}
