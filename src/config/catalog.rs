//! Catalog seed loading from catalog.toml
//!
//! The catalog file lists the product groups (with their subgroups) and the
//! products a fresh install starts with. It is only read to seed an empty
//! catalog; after that the record store is the source of truth.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Catalog shipped with the binary, used when no catalog file is present.
pub const DEFAULT_CATALOG: &str = r#"
[[groups]]
name = "Bebidas"
subgroups = ["Cervejas", "Vinhos", "Cachaças", "Água", "Refri", "Suco"]

[[groups]]
name = "Doces"

[[groups]]
name = "Snacks"

[[groups]]
name = "Outros"

[[products]]
name = "Cerveja Lata"
group = "Bebidas"
subgroup = "Cervejas"
unit_price = "6.50"

[[products]]
name = "Cerveja Long Neck"
group = "Bebidas"
subgroup = "Cervejas"
unit_price = "9.50"

[[products]]
name = "Refrigerante Lata"
group = "Bebidas"
subgroup = "Refri"
unit_price = "5.50"

[[products]]
name = "Água sem gás"
group = "Bebidas"
subgroup = "Água"
unit_price = "4.00"

[[products]]
name = "Suco Natural"
group = "Bebidas"
subgroup = "Suco"
unit_price = "8.00"

[[products]]
name = "Cachaça Dose"
group = "Bebidas"
subgroup = "Cachaças"
unit_price = "7.00"

[[products]]
name = "Chocolate"
group = "Doces"
unit_price = "4.50"

[[products]]
name = "Paçoca"
group = "Doces"
unit_price = "3.00"

[[products]]
name = "Batata Chips"
group = "Snacks"
unit_price = "7.50"

[[products]]
name = "Amendoim"
group = "Snacks"
unit_price = "4.00"

[[products]]
name = "Salgadinho"
group = "Snacks"
unit_price = "6.00"

[[products]]
name = "Gelo (saco)"
group = "Outros"
unit_price = "5.00"
"#;

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    /// Product groups with their subgroups
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    /// Products to create, referencing groups and subgroups by name
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// A product group and its subgroups
#[derive(Debug, Deserialize, Clone)]
pub struct GroupConfig {
    /// Group name
    pub name: String,
    /// Subgroup names
    #[serde(default)]
    pub subgroups: Vec<String>,
}

/// A catalog product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Product name
    pub name: String,
    /// Name of the group, must be listed under `groups`
    pub group: String,
    /// Name of a subgroup of `group`
    #[serde(default)]
    pub subgroup: Option<String>,
    /// Unit price
    pub unit_price: Decimal,
    /// Sold by fraction (weight, dose)
    #[serde(default)]
    pub sells_fractioned: bool,
    /// Visible on the sale screen
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Parses a catalog from TOML text.
///
/// # Errors
/// Returns `Error::Config` if the TOML is invalid or a product references a
/// group that is not declared.
pub fn parse_catalog(contents: &str) -> Result<CatalogConfig> {
    let catalog: CatalogConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog: {e}"),
    })?;

    for product in &catalog.products {
        let group = catalog
            .groups
            .iter()
            .find(|g| g.name == product.group)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "Product '{}' references unknown group '{}'",
                    product.name, product.group
                ),
            })?;
        if let Some(subgroup) = &product.subgroup {
            if !group.subgroups.contains(subgroup) {
                return Err(Error::Config {
                    message: format!(
                        "Product '{}' references unknown subgroup '{}' of '{}'",
                        product.name, subgroup, group.name
                    ),
                });
            }
        }
    }

    Ok(catalog)
}

/// Loads the catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A product references an undeclared group or subgroup
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;
    parse_catalog(&contents)
}

/// Loads the catalog named by `CATALOG_CONFIG` (default `./catalog.toml`),
/// falling back to [`DEFAULT_CATALOG`] when the file does not exist.
pub fn load_default_catalog() -> Result<CatalogConfig> {
    let path = std::env::var("CATALOG_CONFIG").unwrap_or_else(|_| "catalog.toml".to_string());
    if Path::new(&path).exists() {
        tracing::info!("Loading catalog from {}", path);
        load_catalog(path)
    } else {
        tracing::debug!("No catalog file at {}, using the built-in catalog", path);
        parse_catalog(DEFAULT_CATALOG)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_catalog() {
        let toml_str = r#"
            [[groups]]
            name = "Bebidas"
            subgroups = ["Cervejas"]

            [[products]]
            name = "Chopp"
            group = "Bebidas"
            subgroup = "Cervejas"
            unit_price = "12.90"
            sells_fractioned = true
        "#;

        let catalog = parse_catalog(toml_str).unwrap();
        assert_eq!(catalog.groups.len(), 1);
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.products[0].unit_price, dec!(12.90));
        assert!(catalog.products[0].sells_fractioned);
        assert!(catalog.products[0].active);
    }

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = parse_catalog(DEFAULT_CATALOG).unwrap();
        assert_eq!(catalog.groups.len(), 4);
        assert_eq!(catalog.products.len(), 12);
        assert!(catalog.products.iter().all(|p| p.unit_price > Decimal::ZERO));
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let toml_str = r#"
            [[products]]
            name = "Orphan"
            group = "Nowhere"
            unit_price = "1.00"
        "#;

        let result = parse_catalog(toml_str);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_unknown_subgroup_is_rejected() {
        let toml_str = r#"
            [[groups]]
            name = "Doces"

            [[products]]
            name = "Bala"
            group = "Doces"
            subgroup = "Balas"
            unit_price = "0.50"
        "#;

        assert!(parse_catalog(toml_str).is_err());
    }
}
