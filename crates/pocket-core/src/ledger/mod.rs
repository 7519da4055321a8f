//! Monthly savings ledger
//!
//! Rolls expenses up into monthly summaries, scans the trailing window of
//! summaries for uninvested savings and, once enough months qualify, asks the
//! generation backend for investment suggestions.
//!
//! # Flow for one expense
//!
//! 1. Persist the expense under `expenses/{month}/{date}.json`
//! 2. List the month's expenses, sum them plus the current amount, overwrite
//!    `savings/{month}/summary.json` with `invested = false`
//! 3. Scan the trailing months (anchored at today) for uninvested summaries
//! 4. If the scan triggers, request investment suggestions (failures become
//!    a readable string, never an error)
//! 5. Write the report under `reports/{month}/{date}.json`
//! 6. Write `investments/{date}.json` whenever uninvested savings are positive
//!
//! Steps 1-2 are an unguarded read-modify-write. Concurrent expenses in the
//! same month can leave a stale summary unless [`SummaryLocks`] are enabled.
//!
//! Step 2 counts the current expense twice: once from the listing (it was
//! just persisted) and once explicitly. Existing ledgers depend on totals
//! computed this way, so it is kept.

mod locks;

pub use locks::SummaryLocks;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::ai::{parsing, AIBackend, AIClient};
use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::models::lenient::text_from_value;
use crate::models::{
    Extraction, ExpenseRecord, InvestmentRecord, LedgerOutcome, MonthKey, MonthlySummary, Report,
    WindowScan,
};
use crate::prompts::{PromptId, PromptLibrary};
use crate::store::{keys, BlobStore, BlobStoreExt};

/// Prefix of the degraded `investment_suggestions` value on advice failure
pub const ADVICE_ERROR_PREFIX: &str = "Investment suggestion error";

/// Generation settings for the investment-advice call
#[derive(Clone)]
struct Advisor {
    ai: AIClient,
    prompts: Arc<RwLock<PromptLibrary>>,
    max_tokens: u32,
}

/// The ledger engine
///
/// Holds no ledger state of its own; every operation reads and writes the
/// blob store directly.
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn BlobStore>,
    advisor: Option<Advisor>,
    config: LedgerConfig,
    locks: Option<Arc<SummaryLocks>>,
}

impl LedgerEngine {
    /// Create an engine without an advice backend
    ///
    /// Summary bookkeeping works as usual; a triggered advice request yields
    /// the degraded error string.
    pub fn new(store: Arc<dyn BlobStore>, config: LedgerConfig) -> Self {
        let locks = config
            .serialize_summaries
            .then(|| Arc::new(SummaryLocks::new()));
        Self {
            store,
            advisor: None,
            config,
            locks,
        }
    }

    /// Use `ai` for investment advice
    pub fn with_advisor(
        mut self,
        ai: AIClient,
        prompts: Arc<RwLock<PromptLibrary>>,
        max_tokens: u32,
    ) -> Self {
        self.advisor = Some(Advisor {
            ai,
            prompts,
            max_tokens,
        });
        self
    }

    /// Serialize summary updates through the given locks
    pub fn with_locks(mut self, locks: Arc<SummaryLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Drop any summary locks (racy read-modify-write)
    pub fn without_locks(mut self) -> Self {
        self.locks = None;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Record one extracted expense end to end
    ///
    /// `today` anchors the trailing window; the expense's own date picks the
    /// month it is filed under.
    pub async fn record(&self, today: NaiveDate, extraction: Extraction) -> Result<LedgerOutcome> {
        let Extraction {
            expense,
            category,
            budget_tips,
            savings_plan,
            investment_suggestions,
        } = extraction;

        let summary = self.persist_and_summarize(&expense)?;
        let scan = self.scan_window(today)?;

        let advice_requested = scan.triggers(self.config.min_months);
        let investment_suggestions = if advice_requested {
            info!(
                total_savings = %scan.total_savings,
                months_checked = scan.months_checked,
                "Uninvested savings threshold reached, requesting investment advice"
            );
            self.investment_advice(&scan, &investment_suggestions).await
        } else {
            investment_suggestions
        };

        let report = Report {
            category,
            budget_tips,
            savings_plan,
            investment_suggestions,
        };
        self.persist_report(expense.date, &report)?;
        let investment_recorded =
            self.persist_investment(expense.date, &scan, &report.investment_suggestions)?;

        Ok(LedgerOutcome {
            expense,
            summary,
            scan,
            advice_requested,
            investment_recorded,
            report,
        })
    }

    /// Steps 1 and 2, under the month's lock when locking is enabled
    pub fn persist_and_summarize(&self, expense: &ExpenseRecord) -> Result<MonthlySummary> {
        let month_lock = self.locks.as_ref().map(|l| l.lock_for(expense.month()));
        let _guard = month_lock.as_deref().map(locks::acquire);

        self.persist_expense(expense)?;
        self.recompute_summary(expense)
    }

    /// Write the expense, replacing any earlier expense on the same date
    pub fn persist_expense(&self, expense: &ExpenseRecord) -> Result<()> {
        let key = keys::expense(expense.date);
        self.store.put_json(&key, expense)?;
        info!(key = %key, amount = %expense.amount, "Persisted expense");
        Ok(())
    }

    /// Sum of the month's stored expenses plus the current amount
    pub fn month_total(&self, current: &ExpenseRecord) -> Result<Decimal> {
        let month = current.month();
        let prefix = keys::expense_prefix(month);
        self.store
            .list(&prefix)?
            .into_iter()
            .filter_map(|object| {
                match serde_json::from_slice::<ExpenseRecord>(&object.body) {
                    Ok(record) => Some(record.amount),
                    Err(e) => {
                        warn!(key = %object.key, "Skipping malformed expense: {}", e);
                        None
                    }
                }
            })
            .chain(std::iter::once(current.amount))
            .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
            .ok_or_else(|| Error::InvalidData(format!("Expense total for {} overflows", month)))
    }

    /// Overwrite the month's summary with a freshly computed one
    ///
    /// Always writes `invested = false`, clearing any earlier mark.
    pub fn write_summary(&self, month: MonthKey, total_expenses: Decimal) -> Result<MonthlySummary> {
        let summary = MonthlySummary::compute(month, total_expenses, self.config.income);
        self.store.put_json(&keys::summary(month), &summary)?;
        info!(
            month = %month,
            total_expenses = %summary.total_expenses,
            savings = %summary.savings,
            "Updated monthly summary"
        );
        Ok(summary)
    }

    /// Step 2: list, sum and overwrite the summary
    pub fn recompute_summary(&self, current: &ExpenseRecord) -> Result<MonthlySummary> {
        let total = self.month_total(current)?;
        self.write_summary(current.month(), total)
    }

    /// Read a month's summary
    pub fn summary(&self, month: MonthKey) -> Result<Option<MonthlySummary>> {
        self.store.get_json(&keys::summary(month))
    }

    /// Step 3: accumulate uninvested savings over the trailing months
    ///
    /// Missing summaries contribute nothing.
    pub fn scan_window(&self, today: NaiveDate) -> Result<WindowScan> {
        let current = MonthKey::from_date(today);
        let mut scan = WindowScan::default();

        for i in 0..self.config.window_months {
            let month = current.months_back(i);
            match self.summary(month)? {
                Some(summary) if !summary.invested => {
                    scan.total_savings = scan
                        .total_savings
                        .checked_add(summary.savings)
                        .ok_or_else(|| {
                            Error::InvalidData(format!("Savings total overflows at {}", month))
                        })?;
                    scan.months_checked += 1;
                }
                Some(_) => debug!(month = %month, "Skipping invested month"),
                None => debug!(month = %month, "No summary for month"),
            }
        }

        debug!(
            total_savings = %scan.total_savings,
            months_checked = scan.months_checked,
            "Scanned trailing window"
        );
        Ok(scan)
    }

    /// Step 4: ask for investment suggestions
    ///
    /// Never fails: a missing field keeps `current`, any error becomes a
    /// readable `Investment suggestion error: ...` string.
    pub async fn investment_advice(&self, scan: &WindowScan, current: &str) -> String {
        match self.request_advice(scan).await {
            Ok(Some(suggestions)) => suggestions,
            Ok(None) => current.to_string(),
            Err(e) => {
                warn!("Investment advice failed: {}", e);
                format!("{}: {}", ADVICE_ERROR_PREFIX, e)
            }
        }
    }

    async fn request_advice(&self, scan: &WindowScan) -> Result<Option<String>> {
        let advisor = self
            .advisor
            .as_ref()
            .ok_or_else(|| Error::Generation("No AI backend configured".into()))?;
        let total_savings = scan.total_savings.normalize().to_string();
        let months_checked = scan.months_checked.to_string();
        let prompt = {
            let mut prompts = advisor
                .prompts
                .write()
                .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
            let mut vars = HashMap::new();
            vars.insert("total_savings", total_savings.as_str());
            vars.insert("months_checked", months_checked.as_str());
            vars.insert("currency", self.config.currency.as_str());
            prompts.render(PromptId::SuggestInvestments, &vars)?
        };

        let text = advisor.ai.generate(&prompt, advisor.max_tokens).await?;
        debug!("Investment advice response: {}", text);

        let mut map = parsing::parse_strict_json(&text)?;
        Ok(map
            .remove("investment_suggestions")
            .and_then(text_from_value))
    }

    /// Step 5: write the report for this expense
    pub fn persist_report(&self, date: NaiveDate, report: &Report) -> Result<()> {
        let key = keys::report(date);
        self.store.put_json(&key, report)?;
        info!(key = %key, "Persisted report");
        Ok(())
    }

    /// Step 6: log investment history when there are uninvested savings
    ///
    /// Gated only on `total_savings > 0`, looser than the advice trigger, so
    /// partial accumulation is recorded too. Returns whether it wrote.
    pub fn persist_investment(
        &self,
        date: NaiveDate,
        scan: &WindowScan,
        investment_suggestions: &str,
    ) -> Result<bool> {
        if scan.total_savings <= Decimal::ZERO {
            return Ok(false);
        }

        let key = keys::investment(date);
        let record = InvestmentRecord {
            total_savings: scan.total_savings,
            months_checked: scan.months_checked,
            investment_suggestions: investment_suggestions.to_string(),
        };
        self.store.put_json(&key, &record)?;
        info!(key = %key, total_savings = %scan.total_savings, "Persisted investment history");
        Ok(true)
    }

    /// Flag a month's savings as invested so the window scan skips it
    ///
    /// Nothing in the query path calls this, and the next expense in the
    /// month resets the flag when it rewrites the summary.
    pub fn mark_invested(&self, month: MonthKey) -> Result<MonthlySummary> {
        let month_lock = self.locks.as_ref().map(|l| l.lock_for(month));
        let _guard = month_lock.as_deref().map(locks::acquire);

        let mut summary = self
            .summary(month)?
            .ok_or_else(|| Error::NotFound(format!("No summary for {}", month)))?;
        summary.invested = true;
        self.store.put_json(&keys::summary(month), &summary)?;
        info!(month = %month, "Marked month as invested");
        Ok(summary)
    }
}
