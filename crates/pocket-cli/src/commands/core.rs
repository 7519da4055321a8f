//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve the layered configuration
//! - `open_ledger` - Open the configured store as a ledger
//! - `parse_month` - Parse a `YYYY-MM` argument

use std::path::Path;

use anyhow::{Context, Result};
use pocket_core::{open_store, Config, LedgerEngine, MonthKey};

/// Load config from `path`, the data-dir override or the built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

/// Open the configured store without an AI backend
pub fn open_ledger(config: &Config) -> Result<LedgerEngine> {
    let store = open_store(&config.store).context("Failed to open store")?;
    Ok(LedgerEngine::new(store, config.ledger.clone()))
}

pub fn parse_month(month: &str) -> Result<MonthKey> {
    month
        .parse()
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", month))
}
