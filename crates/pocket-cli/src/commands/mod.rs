//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (load_config, open_ledger, parse_month)
//! - `ask` - Record an expense from a free-text query
//! - `ledger` - Monthly summary and mark-invested commands
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod ask;
pub mod core;
pub mod ledger;
pub mod prompts;
pub mod serve;

// Re-export command functions for main.rs
pub use ask::*;
pub use core::*;
pub use ledger::*;
pub use prompts::*;
pub use serve::*;
