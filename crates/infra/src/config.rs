//! Configuration loading and representation.

use thiserror::Error;

use galley_ordering::ReorderPrice;

pub const ENV_REORDER_PRICE: &str = "GALLEY_REORDER_PRICE";
pub const ENV_MONEY_SCALE: &str = "GALLEY_MONEY_SCALE";

const DEFAULT_MONEY_SCALE: u32 = 2;
const MAX_MONEY_SCALE: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Engine settings for the kitchen service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KitchenConfig {
    /// Price used for lines the engine adds on its own.
    pub reorder_price: ReorderPrice,
    /// Decimal places kept on recorded waste cost.
    pub money_scale: u32,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            reorder_price: ReorderPrice::LastPaid,
            money_scale: DEFAULT_MONEY_SCALE,
        }
    }
}

impl KitchenConfig {
    /// Read `GALLEY_REORDER_PRICE` (`last` | `default`) and `GALLEY_MONEY_SCALE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`KitchenConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_REORDER_PRICE) {
            config.reorder_price = match raw.trim().to_ascii_lowercase().as_str() {
                "" | "last" | "last_paid" => ReorderPrice::LastPaid,
                "default" | "list" => ReorderPrice::ListPrice,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: ENV_REORDER_PRICE,
                        value: raw,
                        reason: "expected `last` or `default`",
                    });
                }
            };
        }

        if let Some(raw) = lookup(ENV_MONEY_SCALE) {
            config.money_scale = match raw.trim().parse::<u32>() {
                Ok(scale) if scale <= MAX_MONEY_SCALE => scale,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: ENV_MONEY_SCALE,
                        value: raw,
                        reason: "expected an integer between 0 and 10",
                    });
                }
            };
        }

        Ok(config)
    }
}
