//! Unified error type for the ledger and its record store glue.
//!
//! Variants fall into three groups: validation refusals the UI shows to the
//! operator, missing records, and storage faults propagated from `SeaORM`.

use rust_decimal::Decimal;
use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Generic input validation failure (empty names, future dates, ...)
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the problem
        message: String,
    },

    /// Money amount outside the accepted range
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Sale item quantity outside the accepted range
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: Decimal,
    },

    /// A sale must contain at least one item
    #[error("A sale needs at least one item")]
    EmptySale,

    /// Closing refused because consumption is not covered by payments
    #[error("Comanda still has an outstanding balance of {balance}")]
    OutstandingBalance {
        /// Remaining balance at the time of the attempt
        balance: Decimal,
    },

    /// The comanda is already closed
    #[error("Comanda {id} is already closed")]
    ComandaClosed {
        /// Comanda ID
        id: i64,
    },

    /// No comanda with this ID
    #[error("Comanda not found: {id}")]
    ComandaNotFound {
        /// Comanda ID
        id: i64,
    },

    /// No customer with this ID
    #[error("Customer not found: {id}")]
    CustomerNotFound {
        /// Customer ID
        id: i64,
    },

    /// No product with this ID
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Product ID
        id: i64,
    },

    /// No product group (or subgroup) with this ID
    #[error("Product group not found: {id}")]
    GroupNotFound {
        /// Group or subgroup ID
        id: i64,
    },

    /// No sale with this ID
    #[error("Sale not found: {id}")]
    SaleNotFound {
        /// Sale ID
        id: i64,
    },

    /// No payment with this ID
    #[error("Payment not found: {id}")]
    PaymentNotFound {
        /// Payment ID
        id: i64,
    },

    /// Storage failure, passed through unchanged
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Integer conversion failure (limits, counts)
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Whether this error is a refusal the operator should see, as opposed to
    /// a missing record or a storage fault.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidQuantity { .. }
                | Self::EmptySale
                | Self::OutstandingBalance { .. }
                | Self::ComandaClosed { .. }
        )
    }

    /// Whether this error reports a missing record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ComandaNotFound { .. }
                | Self::CustomerNotFound { .. }
                | Self::ProductNotFound { .. }
                | Self::GroupNotFound { .. }
                | Self::SaleNotFound { .. }
                | Self::PaymentNotFound { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_classification() {
        assert!(Error::EmptySale.is_validation());
        assert!(
            Error::OutstandingBalance {
                balance: dec!(6.00)
            }
            .is_validation()
        );
        assert!(!Error::ComandaNotFound { id: 1 }.is_validation());
        assert!(Error::ComandaNotFound { id: 1 }.is_not_found());
        assert!(!Error::Database(sea_orm::DbErr::Custom("boom".to_string())).is_not_found());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::OutstandingBalance {
            balance: dec!(6.00),
        };
        assert_eq!(
            err.to_string(),
            "Comanda still has an outstanding balance of 6.00"
        );
        assert_eq!(
            Error::ComandaClosed { id: 7 }.to_string(),
            "Comanda 7 is already closed"
        );
    }
}
