use rush_market::MAX_FEE_BPS;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Genesis parameters of a ledger.
///
/// Prices and the fee can later be changed by the operator; the stat and
/// condition bounds are fixed for the lifetime of the ledger. Prices are
/// `u64` here so the file formats can carry them as plain integers; the
/// ledger widens them to [`Amount`](rush_types::Amount).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub mint_price: u64,
    pub repair_price: u64,
    pub repair_amount: u8,
    pub max_condition: u8,
    pub max_stat: u8,
    pub protocol_fee_bps: u16,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mint_price: 1_000_000,
            repair_price: 100_000,
            repair_amount: 100,
            max_condition: 100,
            max_stat: 10,
            protocol_fee_bps: 0,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.max_condition == 0 {
            return Err(LedgerError::InvalidConfig("max_condition must be positive".into()));
        }
        if self.protocol_fee_bps > MAX_FEE_BPS {
            return Err(LedgerError::InvalidConfig(format!(
                "protocol_fee_bps {} exceeds {MAX_FEE_BPS}",
                self.protocol_fee_bps
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = LedgerConfig::default();
        assert_eq!(c.mint_price, 1_000_000);
        assert_eq!(c.repair_price, 100_000);
        assert_eq!(c.max_condition, 100);
        assert_eq!(c.max_stat, 10);
        assert_eq!(c.protocol_fee_bps, 0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let c: LedgerConfig = toml::from_str("mint_price = 5\nprotocol_fee_bps = 250\n").unwrap();
        assert_eq!(c.mint_price, 5);
        assert_eq!(c.protocol_fee_bps, 250);
        assert_eq!(c.repair_amount, 100);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let c = LedgerConfig {
            protocol_fee_bps: 10_001,
            ..LedgerConfig::default()
        };
        assert!(matches!(c.validate(), Err(LedgerError::InvalidConfig(_))));

        let c = LedgerConfig {
            max_condition: 0,
            ..LedgerConfig::default()
        };
        assert!(c.validate().is_err());
    }
}
