//! Report generation business logic.
//!
//! Period summaries, product and customer rankings, and money formatting. All
//! functions return structured data; rendering is left to the caller.

use std::collections::HashMap;

use crate::{
    config::device::DeviceSettings,
    entities::{
        Comanda, Customer, Payment, PaymentMethod, Product, Sale, SaleItem, comanda, customer,
        payment, product, sale, sale_item,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};

/// Consumption and payments over a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodReport {
    /// Window start, inclusive
    pub start: DateTime<Utc>,
    /// Window end, inclusive
    pub end: DateTime<Utc>,
    /// Sum of the subtotals of items sold in the window
    pub consumption_total: Decimal,
    /// Sum of payments received in the window
    pub payments_total: Decimal,
    /// `consumption_total - payments_total`
    pub balance: Decimal,
    /// Payments received per method. Methods with no payment are absent.
    pub payments_by_method: HashMap<PaymentMethod, Decimal>,
    /// Number of sales in the window
    pub sales_count: u64,
    /// Number of item lines across those sales
    pub items_count: u64,
}

impl PeriodReport {
    /// Amount received through `method`, zero when nothing was.
    #[must_use]
    pub fn paid_with(&self, method: PaymentMethod) -> Decimal {
        self.payments_by_method
            .get(&method)
            .copied()
            .unwrap_or_default()
    }
}

/// A product with the total quantity sold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSales {
    /// The product
    pub product: product::Model,
    /// Summed quantity over every recorded item
    pub quantity: Decimal,
}

/// A customer with the number of comandas opened for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerFrequency {
    /// The customer
    pub customer: customer::Model,
    /// Comandas opened, open or closed
    pub tab_count: u64,
}

/// Summarizes the sales and payments stamped within `[start, end]`.
///
/// # Errors
/// Returns `Validation` if `start` is after `end`.
#[instrument(skip(db))]
pub async fn period_report(
    db: &DatabaseConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<PeriodReport> {
    if start > end {
        return Err(Error::Validation {
            message: "Report start must not be after its end".to_string(),
        });
    }

    let txn = db.begin().await?;

    let sales = Sale::find()
        .filter(sale::Column::CreatedAt.between(start, end))
        .all(&txn)
        .await?;
    let sale_ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
    let items = if sale_ids.is_empty() {
        Vec::new()
    } else {
        SaleItem::find()
            .filter(sale_item::Column::SaleId.is_in(sale_ids))
            .all(&txn)
            .await?
    };
    let payments = Payment::find()
        .filter(payment::Column::CreatedAt.between(start, end))
        .all(&txn)
        .await?;

    txn.commit().await?;

    let consumption_total: Decimal = items.iter().map(|i| i.subtotal).sum();
    let payments_total: Decimal = payments.iter().map(|p| p.amount).sum();
    let mut payments_by_method: HashMap<PaymentMethod, Decimal> = HashMap::new();
    for p in &payments {
        *payments_by_method.entry(p.method).or_default() += p.amount;
    }

    debug!(
        "Period report: {} sale(s), {} item(s), {} payment(s)",
        sales.len(),
        items.len(),
        payments.len()
    );

    Ok(PeriodReport {
        start,
        end,
        consumption_total,
        payments_total,
        balance: consumption_total - payments_total,
        payments_by_method,
        sales_count: u64::try_from(sales.len())?,
        items_count: u64::try_from(items.len())?,
    })
}

/// Ranks products by the total quantity sold, best sellers first.
///
/// Items whose product has since been deleted are left out. Ties are broken by
/// product name.
pub async fn top_products(db: &DatabaseConnection, limit: usize) -> Result<Vec<ProductSales>> {
    let txn = db.begin().await?;
    let items = SaleItem::find().all(&txn).await?;
    let products: HashMap<i64, product::Model> = Product::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    txn.commit().await?;

    let mut quantities: HashMap<i64, Decimal> = HashMap::new();
    for item in &items {
        *quantities.entry(item.product_id).or_default() += item.quantity;
    }

    let mut ranking: Vec<ProductSales> = quantities
        .into_iter()
        .filter_map(|(product_id, quantity)| {
            products.get(&product_id).map(|product| ProductSales {
                product: product.clone(),
                quantity,
            })
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product.name.cmp(&b.product.name))
    });
    ranking.truncate(limit);
    Ok(ranking)
}

/// Ranks customers by how many comandas were opened for them.
///
/// Anonymous comandas and deleted customers are left out. Ties are broken by
/// customer name.
pub async fn frequent_customers(
    db: &DatabaseConnection,
    limit: usize,
) -> Result<Vec<CustomerFrequency>> {
    let txn = db.begin().await?;
    let tabs = Comanda::find()
        .filter(comanda::Column::CustomerId.is_not_null())
        .all(&txn)
        .await?;
    let customers = Customer::find().all(&txn).await?;
    txn.commit().await?;

    let mut counts: HashMap<i64, u64> = HashMap::new();
    for customer_id in tabs.iter().filter_map(|t| t.customer_id) {
        *counts.entry(customer_id).or_default() += 1;
    }

    let mut ranking: Vec<CustomerFrequency> = customers
        .into_iter()
        .filter_map(|customer| {
            counts.get(&customer.id).map(|&tab_count| CustomerFrequency {
                customer,
                tab_count,
            })
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.tab_count
            .cmp(&a.tab_count)
            .then_with(|| a.customer.name.cmp(&b.customer.name))
    });
    ranking.truncate(limit);
    Ok(ranking)
}

/// Formats an amount with `symbol`, dot thousands and a comma before cents.
fn format_money(symbol: &str, amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{symbol} {grouped},{cents}")
}

/// Formats an amount in Brazilian reais, like `R$ 1.234,50` or `-R$ 6,00`.
#[must_use]
pub fn format_brl(amount: Decimal) -> String {
    format_money("R$", amount)
}

/// Formats an amount for display on this device, masking it when amounts are hidden.
#[must_use]
pub fn format_amount(settings: &DeviceSettings, amount: Decimal) -> String {
    if settings.hide_amounts {
        format!("{} •••", settings.currency_symbol)
    } else {
        format_money(&settings.currency_symbol, amount)
    }
}
