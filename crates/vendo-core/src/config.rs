//! # Machine Configuration
//!
//! Settings supplied once at startup and immutable for the process lifetime.
//!
//! ## Fields
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MachineConfig                                                          │
//! │  ├── denominations         {10, 20, 50, 100, 200}                       │
//! │  ├── reserve_threshold     10 coins kept back per denomination          │
//! │  ├── reserve_overrides     per-denomination exceptions                  │
//! │  ├── slot_limit            20 product slots                             │
//! │  └── max_product_quantity  10 units per slot                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Loading from files and the environment is the application's concern;
//! this type only describes and validates the values.

use serde::{Deserialize, Serialize};

use crate::denomination::{Denomination, Denominations};
use crate::error::{CoreError, CoreResult};

/// Coins of each denomination the till always keeps for change.
pub const DEFAULT_RESERVE_THRESHOLD: u32 = 10;

/// Number of product slots in the machine.
pub const DEFAULT_SLOT_LIMIT: usize = 20;

/// Units a single slot can hold.
pub const DEFAULT_MAX_PRODUCT_QUANTITY: u32 = 10;

/// A reserve that differs from the default for one denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveOverride {
    pub denomination: u32,
    pub reserve: u32,
}

/// Complete machine configuration.
///
/// ## Example (TOML)
/// ```toml
/// denominations = [10, 20, 50, 100, 200]
/// reserve_threshold = 10
/// slot_limit = 20
/// max_product_quantity = 10
///
/// [[reserve_overrides]]
/// denomination = 10
/// reserve = 25
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub denominations: Denominations,
    pub reserve_threshold: u32,
    pub reserve_overrides: Vec<ReserveOverride>,
    pub slot_limit: usize,
    pub max_product_quantity: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            denominations: Denominations::default(),
            reserve_threshold: DEFAULT_RESERVE_THRESHOLD,
            reserve_overrides: Vec::new(),
            slot_limit: DEFAULT_SLOT_LIMIT,
            max_product_quantity: DEFAULT_MAX_PRODUCT_QUANTITY,
        }
    }
}

impl MachineConfig {
    /// Reserve for one denomination, honouring overrides.
    pub fn reserve_for(&self, denomination: Denomination) -> u32 {
        self.reserve_overrides
            .iter()
            .find(|o| o.denomination == denomination.stotinki())
            .map(|o| o.reserve)
            .unwrap_or(self.reserve_threshold)
    }

    /// Validates the configuration.
    ///
    /// The denomination set validates itself on construction; this checks
    /// the remaining fields against it.
    pub fn validate(&self) -> CoreResult<()> {
        for o in &self.reserve_overrides {
            if self.denominations.get(o.denomination).is_err() {
                return Err(CoreError::InvalidConfig(format!(
                    "reserve override for unknown denomination {}",
                    o.denomination
                )));
            }
        }

        if self.slot_limit == 0 {
            return Err(CoreError::InvalidConfig(
                "slot_limit must be greater than 0".into(),
            ));
        }

        // Product quantity is stored in a single byte
        if self.max_product_quantity == 0 || self.max_product_quantity > u8::MAX as u32 {
            return Err(CoreError::InvalidConfig(format!(
                "max_product_quantity must be between 1 and {}",
                u8::MAX
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MachineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reserve_for(Denomination::new(50)), 10);
        assert_eq!(config.slot_limit, 20);
    }

    #[test]
    fn test_reserve_override() {
        let config = MachineConfig {
            reserve_overrides: vec![ReserveOverride {
                denomination: 10,
                reserve: 25,
            }],
            ..MachineConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.reserve_for(Denomination::new(10)), 25);
        assert_eq!(config.reserve_for(Denomination::new(20)), 10);
    }

    #[test]
    fn test_config_validation() {
        let mut config = MachineConfig::default();

        config.reserve_overrides.push(ReserveOverride {
            denomination: 5,
            reserve: 1,
        });
        assert!(config.validate().is_err());

        config.reserve_overrides.clear();
        config.slot_limit = 0;
        assert!(config.validate().is_err());

        config.slot_limit = 20;
        config.max_product_quantity = 300;
        assert!(config.validate().is_err());
    }
}
