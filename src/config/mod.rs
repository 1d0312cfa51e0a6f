/// Database configuration and connection management
pub mod database;

/// Catalog seed loading from catalog.toml
pub mod catalog;

/// Process-local device settings from environment variables
pub mod device;
