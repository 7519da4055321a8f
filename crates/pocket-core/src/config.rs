//! Runtime configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, else the override in the data dir
//!    (~/.local/share/pocket/config/pocket.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top of whichever file was used.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{StoreBackend, StoreConfig};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/pocket.toml");

/// Ledger rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Monthly income applied to every summary
    pub income: Decimal,
    /// Currency label used in prompt text
    pub currency: String,
    /// Trailing months scanned, current month included
    pub window_months: u32,
    /// Months with uninvested savings required to ask for advice
    pub min_months: u32,
    /// Serialize per-month summary updates within this process
    pub serialize_summaries: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            income: Decimal::from(50_000),
            currency: "INR".to_string(),
            window_months: 6,
            min_months: 5,
            serialize_summaries: false,
        }
    }
}

/// Output limits for the two generation calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub extraction_max_tokens: u32,
    pub advice_max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            extraction_max_tokens: 1500,
            advice_max_tokens: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration and apply environment overrides
    ///
    /// An explicit `path` must exist. Without one, the data-dir override is
    /// used when present, otherwise the embedded defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => read_config(path)?,
            None => match default_config_path() {
                Some(default_path) if default_path.exists() => read_config(&default_path)?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        let mut config = Self::from_toml(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded defaults, without environment overrides
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Parse config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Apply `POCKET_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(income) = lookup("POCKET_INCOME") {
            self.ledger.income = Decimal::from_str(income.trim())
                .map_err(|e| Error::Config(format!("Invalid POCKET_INCOME {:?}: {}", income, e)))?;
        }
        if let Some(backend) = lookup("POCKET_STORE") {
            self.store.backend = StoreBackend::from_str(&backend)?;
        }
        if let Some(dir) = lookup("POCKET_STORE_DIR") {
            if !dir.trim().is_empty() {
                self.store.path = Some(PathBuf::from(dir));
            }
        }
        if let Some(flag) = lookup("POCKET_SERIALIZE_SUMMARIES") {
            self.ledger.serialize_summaries = parse_flag(&flag).ok_or_else(|| {
                Error::Config(format!("Invalid POCKET_SERIALIZE_SUMMARIES {:?}", flag))
            })?;
        }
        Ok(())
    }

    /// Reject settings the ledger cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.ledger.income < Decimal::ZERO {
            return Err(Error::Config("income must not be negative".into()));
        }
        if self.ledger.window_months == 0 {
            return Err(Error::Config("window_months must be at least 1".into()));
        }
        if self.ledger.min_months > self.ledger.window_months {
            return Err(Error::Config(format!(
                "min_months ({}) exceeds window_months ({})",
                self.ledger.min_months, self.ledger.window_months
            )));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pocket").join("config").join("pocket.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config {}: {}", path.display(), e)))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_embedded_defaults() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.ledger.income, Decimal::from(50_000));
        assert_eq!(config.ledger.currency, "INR");
        assert_eq!(config.ledger.window_months, 6);
        assert_eq!(config.ledger.min_months, 5);
        assert!(!config.ledger.serialize_summaries);
        assert_eq!(config.generation.extraction_max_tokens, 1500);
        assert_eq!(config.generation.advice_max_tokens, 500);
        assert_eq!(config.store.backend, StoreBackend::Local);
        assert!(config.store.path.is_none());

        // Embedded file and code defaults agree
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("[ledger]\nincome = 80000.50\n").unwrap();
        assert_eq!(config.ledger.income, Decimal::new(8_000_050, 2));
        assert_eq!(config.ledger.min_months, 5);
        assert_eq!(config.generation, GenerationConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml("[ledger\nincome = ").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("POCKET_INCOME", "60000"),
                ("POCKET_STORE", "memory"),
                ("POCKET_STORE_DIR", "/tmp/pocket-store"),
                ("POCKET_SERIALIZE_SUMMARIES", "true"),
            ]))
            .unwrap();

        assert_eq!(config.ledger.income, Decimal::from(60_000));
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/pocket-store")));
        assert!(config.ledger.serialize_summaries);
    }

    #[test]
    fn test_bad_env_override() {
        let mut config = Config::default();
        assert!(config
            .apply_overrides(lookup_from(&[("POCKET_INCOME", "lots")]))
            .is_err());
        assert!(config
            .apply_overrides(lookup_from(&[("POCKET_SERIALIZE_SUMMARIES", "maybe")]))
            .is_err());
        assert!(config
            .apply_overrides(lookup_from(&[("POCKET_STORE", "s3")]))
            .is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.ledger.min_months = 7;
        assert!(config.validate().is_err());

        config.ledger.min_months = 0;
        config.ledger.window_months = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ledger.income = Decimal::from(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pocket.toml");
        std::fs::write(&path, "[generation]\nadvice_max_tokens = 256\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.generation.advice_max_tokens, 256);

        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
