//! Ask command implementation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pocket_core::ai::{AIBackend, AIClient};
use pocket_core::{FinanceAssistant, LedgerOutcome};

pub async fn cmd_ask(
    config: pocket_core::Config,
    query: &str,
    date: Option<NaiveDate>,
) -> Result<()> {
    let Some(ai) = AIClient::from_env() else {
        anyhow::bail!(
            "No AI backend configured. Set ANTHROPIC_COMPATIBLE_HOST, or AI_BACKEND=ollama with OLLAMA_HOST"
        );
    };
    println!("🤖 Using {} ({})", ai.model(), ai.host());

    let assistant = FinanceAssistant::from_config(config, ai).context("Failed to open store")?;
    let today = date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let outcome = run_query(&assistant, query, today).await?;
    print_outcome(&outcome)?;

    Ok(())
}

/// Extract and record one expense
pub async fn run_query(
    assistant: &FinanceAssistant,
    query: &str,
    today: NaiveDate,
) -> Result<LedgerOutcome> {
    assistant
        .handle_query(query, today)
        .await
        .context("Query failed")
}

fn print_outcome(outcome: &LedgerOutcome) -> Result<()> {
    let expense = &outcome.expense;
    let summary = &outcome.summary;

    println!();
    println!(
        "✅ Recorded {} on {} ({})",
        expense.amount, expense.item, expense.date
    );
    println!(
        "   {}: spent {} of {}, saving {}",
        summary.month, summary.total_expenses, summary.income, summary.savings
    );
    if outcome.advice_requested {
        println!(
            "   💡 {} months with uninvested savings ({} total)",
            outcome.scan.months_checked, outcome.scan.total_savings
        );
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);

    Ok(())
}
