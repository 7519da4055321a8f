//! Ledger command implementations

use anyhow::Result;
use pocket_core::{LedgerEngine, MonthlySummary};

use super::parse_month;

/// Show the savings summary for a month
pub fn cmd_summary(ledger: &LedgerEngine, month: &str) -> Result<()> {
    let month = parse_month(month)?;

    match ledger.summary(month)? {
        Some(summary) => print_summary(&summary),
        None => println!("No expenses recorded for {}", month),
    }

    Ok(())
}

/// Flag a month's savings as invested
pub fn cmd_mark_invested(ledger: &LedgerEngine, month: &str) -> Result<()> {
    let month = parse_month(month)?;
    let summary = ledger.mark_invested(month)?;

    println!("✅ Marked {} as invested", month);
    println!("   Recording another expense in {} resets this flag.", month);
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &MonthlySummary) {
    println!();
    println!("📅 {}", summary.month);
    println!("   Expenses:  {:>12}", summary.total_expenses.to_string());
    println!("   Income:    {:>12}", summary.income.to_string());
    println!("   Savings:   {:>12}", summary.savings.to_string());
    println!(
        "   Invested:  {:>12}",
        if summary.invested { "yes" } else { "no" }
    );
}
