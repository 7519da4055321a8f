//! Query service
//!
//! Wires the extractor and the ledger together: one query in, one recorded
//! expense and report out.

use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use tracing::info;

use crate::ai::{AIBackend, AIClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::ExpenseExtractor;
use crate::ledger::LedgerEngine;
use crate::models::LedgerOutcome;
use crate::prompts::PromptLibrary;
use crate::store::{open_store, BlobStore};

/// Personal finance assistant over a blob store and a generation backend
#[derive(Clone)]
pub struct FinanceAssistant {
    ai: AIClient,
    extractor: ExpenseExtractor,
    ledger: LedgerEngine,
    config: Config,
}

impl FinanceAssistant {
    pub fn new(
        config: Config,
        store: Arc<dyn BlobStore>,
        ai: AIClient,
        prompts: PromptLibrary,
    ) -> Self {
        let prompts = Arc::new(RwLock::new(prompts));
        let extractor = ExpenseExtractor::new(
            ai.clone(),
            prompts.clone(),
            config.ledger.currency.clone(),
            config.generation.extraction_max_tokens,
        );
        let ledger = LedgerEngine::new(store, config.ledger.clone()).with_advisor(
            ai.clone(),
            prompts,
            config.generation.advice_max_tokens,
        );

        Self {
            ai,
            extractor,
            ledger,
            config,
        }
    }

    /// Open the configured store and use the default prompt library
    pub fn from_config(config: Config, ai: AIClient) -> Result<Self> {
        let store = open_store(&config.store)?;
        Ok(Self::new(config, store, ai, PromptLibrary::new()))
    }

    /// Extract an expense from `query` and record it
    ///
    /// `today` anchors both the default expense date (the day before) and
    /// the trailing savings window.
    pub async fn handle_query(&self, query: &str, today: NaiveDate) -> Result<LedgerOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidData("No query provided".into()));
        }

        let yesterday = today
            .pred_opt()
            .ok_or_else(|| Error::InvalidData(format!("No day before {}", today)))?;

        let extraction = self.extractor.extract(query, yesterday).await?;
        let outcome = self.ledger.record(today, extraction).await?;

        info!(
            date = %outcome.expense.date,
            category = %outcome.report.category,
            advice_requested = outcome.advice_requested,
            "Recorded query"
        );
        Ok(outcome)
    }

    pub fn ledger(&self) -> &LedgerEngine {
        &self.ledger
    }

    pub fn ai(&self) -> &AIClient {
        &self.ai
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        self.ledger.store()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the generation model in use
    pub fn model(&self) -> &str {
        self.ai.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::store::MemoryStore;

    fn assistant(mock: MockBackend) -> FinanceAssistant {
        FinanceAssistant::new(
            Config::default(),
            Arc::new(MemoryStore::new()),
            AIClient::mock(mock),
            PromptLibrary::embedded_only(),
        )
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_before_generation() {
        let mock = MockBackend::new();
        let assistant = assistant(mock.clone());
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        let err = assistant.handle_query("   ", today).await.unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_yesterday_is_passed_to_prompt() {
        let mock = MockBackend::new();
        mock.push_response(r#"{"expense": {"item": "tea", "amount": 20}}"#);
        let assistant = assistant(mock.clone());
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let outcome = assistant.handle_query("tea for 20", today).await.unwrap();
        assert_eq!(
            outcome.expense.date,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(mock.prompts()[0].contains("assume yesterday (2024-02-29)"));
    }
}
