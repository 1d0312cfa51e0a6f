//! Core business logic - the comanda ledger and the record store glue around it.
//!
//! Every function takes the database connection explicitly and, where it
//! stamps a record, a [`clock::Clock`]. Multi-record reads and writes run in a
//! single `SeaORM` transaction, so callers never observe a sale without its
//! items or totals mixed from before and after a write.

/// Catalog operations: groups, subgroups, products and seeding
pub mod catalog;
/// Time source passed into stamping operations
pub mod clock;
/// Tab lifecycle and balance derivation
pub mod comanda;
/// Customer operations
pub mod customer;
/// Payments against a comanda
pub mod payment;
/// Period reports and rankings
pub mod report;
/// Sales and their line items
pub mod sale;

use crate::errors::{Error, Result};

/// Trims optional free text, mapping blank input to `None`.
pub(crate) fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims a required name, rejecting blank input.
pub(crate) fn normalize_name(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{what} name cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_optional_text() {
        assert_eq!(normalize_optional_text(None), None);
        assert_eq!(normalize_optional_text(Some("   ".to_string())), None);
        assert_eq!(
            normalize_optional_text(Some(" fiado até sexta ".to_string())),
            Some("fiado até sexta".to_string())
        );
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Zé  ", "Customer").ok(), Some("Zé".to_string()));
        assert!(matches!(
            normalize_name(" ", "Customer"),
            Err(Error::Validation { .. })
        ));
    }
}
