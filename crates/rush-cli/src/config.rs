use std::path::Path;

use anyhow::Context;
use rush_generator::GeneratorConfig;
use rush_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};

/// Contents of `rush.toml`. A missing file means all defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RushConfig {
    pub ledger: LedgerConfig,
    pub generator: GeneratorConfig,
}

impl RushConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        config.ledger.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RushConfig::load(&dir.path().join("rush.toml")).unwrap();
        assert_eq!(config, RushConfig::default());
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rush.toml");
        std::fs::write(
            &path,
            "[ledger]\nmint_price = 250\nprotocol_fee_bps = 150\n\n[generator]\nendpoint = \"http://gen:8080\"\n",
        )
        .unwrap();

        let config = RushConfig::load(&path).unwrap();
        assert_eq!(config.ledger.mint_price, 250);
        assert_eq!(config.ledger.protocol_fee_bps, 150);
        assert_eq!(config.ledger.max_condition, LedgerConfig::default().max_condition);
        assert_eq!(config.generator.endpoint, "http://gen:8080");
        assert_eq!(config.generator.timeout_secs, GeneratorConfig::default().timeout_secs);
    }

    #[test]
    fn invalid_fee_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rush.toml");
        std::fs::write(&path, "[ledger]\nprotocol_fee_bps = 20000\n").unwrap();
        assert!(RushConfig::load(&path).is_err());
    }
}
