//! Device settings loaded from environment variables.
//!
//! These are display preferences of the machine running the register. They
//! are process-local and deliberately kept out of the record store.

/// Process-local display settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Mask money amounts on screen and in logs (`HIDE_AMOUNTS`)
    pub hide_amounts: bool,
    /// Currency symbol prefixed to formatted amounts (`CURRENCY_SYMBOL`)
    pub currency_symbol: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            hide_amounts: false,
            currency_symbol: "R$".to_string(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Reads `HIDE_AMOUNTS` and `CURRENCY_SYMBOL`, defaulting to visible amounts in reais.
#[must_use]
pub fn get_device_settings() -> DeviceSettings {
    let defaults = DeviceSettings::default();
    DeviceSettings {
        hide_amounts: std::env::var("HIDE_AMOUNTS")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.hide_amounts),
        currency_symbol: std::env::var("CURRENCY_SYMBOL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.currency_symbol),
    }
}
