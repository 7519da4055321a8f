//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::sync::Arc;

use chrono::NaiveDate;
use pocket_core::{
    AIClient, BlobStore, Config, FinanceAssistant, LedgerConfig, LedgerEngine, LocalStore,
    MemoryStore, MockBackend, MonthKey, PromptId, PromptLibrary, StoreBackend, StoreConfig,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

use crate::commands;

fn setup_test_ledger() -> (LedgerEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let ledger = LedgerEngine::new(store.clone(), LedgerConfig::default());
    (ledger, store)
}

fn month(s: &str) -> MonthKey {
    s.parse().unwrap()
}

fn reply(date: &str, amount: i64) -> String {
    serde_json::json!({
        "expense": {"date": date, "item": "coffee", "amount": amount},
        "category": "Food",
        "budget_tips": "Brew at home",
        "savings_plan": [],
        "investment_suggestions": ""
    })
    .to_string()
}

// ========== Core Utility Tests ==========

#[test]
fn test_parse_month() {
    assert_eq!(commands::parse_month("2024-05").unwrap(), month("2024-05"));
    assert!(commands::parse_month("May 2024").is_err());
    assert!(commands::parse_month("2024-13").is_err());
}

#[test]
fn test_load_config_explicit_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pocket.toml");
    std::fs::write(
        &path,
        "[ledger]\nincome = 80000\ncurrency = \"USD\"\n\n[store]\nbackend = \"memory\"\n",
    )
    .unwrap();

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.ledger.currency, "USD");
    assert_eq!(config.ledger.window_months, 6);
}

#[test]
fn test_load_config_missing_path() {
    let temp = TempDir::new().unwrap();
    let result = commands::load_config(Some(&temp.path().join("missing.toml")));
    assert!(result.is_err());
}

#[test]
fn test_open_ledger_local_store() {
    let temp = TempDir::new().unwrap();
    let config = Config {
        store: StoreConfig {
            backend: StoreBackend::Local,
            path: Some(temp.path().to_path_buf()),
        },
        ..Config::default()
    };

    let ledger = commands::open_ledger(&config).unwrap();
    assert_eq!(ledger.store().name(), "local");
    assert!(ledger.summary(month("2024-05")).unwrap().is_none());
}

#[test]
fn test_parse_origins() {
    assert_eq!(
        commands::parse_origins(" http://a.test , ,http://b.test"),
        vec!["http://a.test", "http://b.test"]
    );
    assert!(commands::parse_origins("").is_empty());
}

// ========== Ask Command Tests ==========

#[tokio::test]
async fn test_run_query_records_expense() {
    let store = Arc::new(MemoryStore::new());
    let mock = MockBackend::new();
    mock.push_response(reply("2024-05-01", 150));
    let assistant = FinanceAssistant::new(
        Config::default(),
        store.clone(),
        AIClient::mock(mock.clone()),
        PromptLibrary::embedded_only(),
    );
    let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

    let outcome = commands::run_query(&assistant, "coffee 150", today)
        .await
        .unwrap();

    assert_eq!(outcome.report.category, "Food");
    assert_eq!(outcome.summary.total_expenses, Decimal::from(300));
    assert!(!outcome.advice_requested);
    assert!(store
        .keys()
        .contains(&"expenses/2024-05/2024-05-01.json".to_string()));
}

#[tokio::test]
async fn test_run_query_reports_extraction_failure() {
    let store = Arc::new(MemoryStore::new());
    let mock = MockBackend::new();
    mock.push_response("I could not find an expense");
    let assistant = FinanceAssistant::new(
        Config::default(),
        store.clone(),
        AIClient::mock(mock),
        PromptLibrary::embedded_only(),
    );
    let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

    let result = commands::run_query(&assistant, "hello", today).await;
    assert!(result.is_err());
    assert!(store.is_empty());
}

// ========== Ledger Command Tests ==========

#[test]
fn test_cmd_summary_missing_month() {
    let (ledger, _store) = setup_test_ledger();
    let result = commands::cmd_summary(&ledger, "2024-05");
    assert!(result.is_ok());
}

#[test]
fn test_cmd_summary_invalid_month() {
    let (ledger, _store) = setup_test_ledger();
    assert!(commands::cmd_summary(&ledger, "2024/05").is_err());
}

#[test]
fn test_cmd_mark_invested() {
    let (ledger, _store) = setup_test_ledger();
    ledger
        .write_summary(month("2024-04"), Decimal::from(20_000))
        .unwrap();

    commands::cmd_mark_invested(&ledger, "2024-04").unwrap();

    let summary = ledger.summary(month("2024-04")).unwrap().unwrap();
    assert!(summary.invested);
    assert_eq!(summary.savings, Decimal::from(30_000));
    assert!(commands::cmd_summary(&ledger, "2024-04").is_ok());
}

#[test]
fn test_cmd_mark_invested_missing_month() {
    let (ledger, store) = setup_test_ledger();
    let result = commands::cmd_mark_invested(&ledger, "2024-04");
    assert!(result.is_err());
    assert!(store.is_empty());
}

#[test]
fn test_mark_invested_through_local_store() {
    let temp = TempDir::new().unwrap();
    let ledger = LedgerEngine::new(
        Arc::new(LocalStore::new(temp.path()).unwrap()),
        LedgerConfig::default(),
    );
    ledger
        .write_summary(month("2024-03"), Decimal::from(1_000))
        .unwrap();

    commands::cmd_mark_invested(&ledger, "2024-03").unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
    let scan = ledger.scan_window(today).unwrap();
    assert_eq!(scan.months_checked, 0);
}

// ========== Prompts Command Tests ==========

#[test]
fn test_find_prompt_id() {
    assert_eq!(
        commands::find_prompt_id("extract_expense"),
        Some(PromptId::ExtractExpense)
    );
    assert_eq!(
        commands::find_prompt_id("suggest_investments"),
        Some(PromptId::SuggestInvestments)
    );
    assert_eq!(commands::find_prompt_id("classify_merchant"), None);
}

#[test]
fn test_cmd_prompts_show_unknown_is_not_an_error() {
    assert!(commands::cmd_prompts_show("nope").is_ok());
}

#[test]
fn test_cmd_prompts_list() {
    assert!(commands::cmd_prompts_list().is_ok());
}
