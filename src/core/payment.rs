//! Payment business logic - Settlements applied against a comanda.
//!
//! Payments are independent of the balance: partial payments and
//! overpayments are both accepted. Only closing a tab looks at the balance.

use crate::{
    core::{
        clock::Clock,
        comanda::{mark_closed, require_comanda, totals_in},
        normalize_optional_text,
    },
    entities::{Payment, PaymentMethod, comanda, payment},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument, warn};

/// Outcome of [`pay_and_close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// The payment that was recorded
    pub payment: payment::Model,
    /// The comanda after the call, closed if the payment settled it
    pub comanda: comanda::Model,
}

impl Settlement {
    /// Whether the comanda ended up closed.
    #[must_use]
    pub fn closed(&self) -> bool {
        !self.comanda.is_open()
    }
}

async fn insert_payment<C>(
    db: &C,
    clock: &impl Clock,
    comanda_id: i64,
    method: PaymentMethod,
    amount: Decimal,
    notes: Option<String>,
) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    payment::ActiveModel {
        comanda_id: Set(comanda_id),
        created_at: Set(clock.now()),
        method: Set(method),
        amount: Set(amount),
        notes: Set(normalize_optional_text(notes)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Records a payment on a comanda.
///
/// # Errors
/// - `InvalidAmount` if `amount` is not positive
/// - `ComandaNotFound` if the comanda does not exist
#[instrument(skip(db, clock, notes))]
pub async fn record_payment(
    db: &DatabaseConnection,
    clock: &impl Clock,
    comanda_id: i64,
    method: PaymentMethod,
    amount: Decimal,
    notes: Option<String>,
) -> Result<payment::Model> {
    validate_amount(amount)?;

    let txn = db.begin().await?;
    require_comanda(&txn, comanda_id).await?;
    let payment = insert_payment(&txn, clock, comanda_id, method, amount, notes).await?;
    txn.commit().await?;

    info!(
        "Recorded payment {} on comanda {}: method={:?}, amount={}",
        payment.id, comanda_id, method, amount
    );
    Ok(payment)
}

/// Records a payment and closes the comanda when it covers `due`.
///
/// This is the quick-sale checkout: the caller passes the amount it just
/// charged as `due`. The tab is closed only if `amount >= due` and the derived
/// balance after the payment is settled, the same guard [`close_tab`] applies.
/// Otherwise the payment stays recorded and the tab stays open.
///
/// [`close_tab`]: crate::core::comanda::close_tab
///
/// # Errors
/// - `InvalidAmount` if `amount` is not positive
/// - `ComandaNotFound` if the comanda does not exist
/// - `ComandaClosed` if it is already closed
#[instrument(skip(db, clock, notes))]
pub async fn pay_and_close(
    db: &DatabaseConnection,
    clock: &impl Clock,
    comanda_id: i64,
    method: PaymentMethod,
    amount: Decimal,
    due: Decimal,
    notes: Option<String>,
) -> Result<Settlement> {
    validate_amount(amount)?;

    let txn = db.begin().await?;
    let tab = require_comanda(&txn, comanda_id).await?;
    if !tab.is_open() {
        return Err(Error::ComandaClosed { id: comanda_id });
    }

    let payment = insert_payment(&txn, clock, comanda_id, method, amount, notes).await?;

    let comanda = if amount >= due {
        let totals = totals_in(&txn, comanda_id).await?;
        if totals.is_settled() {
            mark_closed(&txn, clock, tab).await?
        } else {
            warn!(
                "Payment covers the sale but comanda {} still owes {}, leaving it open",
                comanda_id, totals.balance
            );
            tab
        }
    } else {
        tab
    };
    txn.commit().await?;

    info!(
        "Recorded payment {} on comanda {} (closed: {})",
        payment.id,
        comanda_id,
        !comanda.is_open()
    );
    Ok(Settlement { payment, comanda })
}

/// Lists the payments of a comanda, newest first.
pub async fn list_payments(
    db: &DatabaseConnection,
    comanda_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::ComandaId.eq(comanda_id))
        .order_by_desc(payment::Column::CreatedAt)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a payment recorded by mistake.
///
/// Payments on a closed comanda are frozen, so a closed tab can never end up
/// owing money.
///
/// # Errors
/// - `PaymentNotFound` if the payment does not exist
/// - `ComandaClosed` if its comanda is closed
#[instrument(skip(db))]
pub async fn delete_payment(db: &DatabaseConnection, payment_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let payment = Payment::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })?;
    let tab = require_comanda(&txn, payment.comanda_id).await?;
    if !tab.is_open() {
        return Err(Error::ComandaClosed { id: tab.id });
    }

    payment.delete(&txn).await?;
    txn.commit().await?;

    info!("Deleted payment {} from comanda {}", payment_id, tab.id);
    Ok(())
}
