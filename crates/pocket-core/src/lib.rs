//! Pocket Core Library
//!
//! Shared functionality for the Pocket expense ledger:
//! - Blob store with pluggable backends (local directory, in-memory)
//! - Pluggable text-generation backends (Anthropic Messages API, Ollama)
//! - Prompt library for customizable prompts
//! - Expense extraction from free-text queries
//! - Monthly savings ledger with trailing-window investment advice
//! - Layered TOML configuration

pub mod ai;
pub mod config;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod models;
pub mod prompts;
pub mod service;
pub mod store;

/// Test utilities including a mock generation server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, AnthropicCompatBackend, MockBackend, OllamaBackend};
pub use config::{Config, GenerationConfig, LedgerConfig};
pub use error::{Error, ExtractionError, Result};
pub use extract::ExpenseExtractor;
pub use ledger::{LedgerEngine, SummaryLocks};
pub use models::{
    Extraction, ExpenseRecord, InvestmentRecord, LedgerOutcome, MonthKey, MonthlySummary, Report,
    SavingsStep, WindowScan,
};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use service::FinanceAssistant;
pub use store::{open_store, BlobStore, BlobStoreExt, LocalStore, MemoryStore, StoreBackend, StoreConfig};
