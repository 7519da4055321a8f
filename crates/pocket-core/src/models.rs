//! Data models for Pocket
//!
//! Everything persisted in the blob store is defined here. Amounts are exact
//! decimals; they travel as plain JSON numbers.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Calendar month key (`YYYY-MM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidData(format!("Invalid month: {}", month)));
        }
        if !(0..=9999).contains(&year) {
            return Err(Error::InvalidData(format!("Invalid year: {}", year)));
        }
        Ok(Self { year, month })
    }

    /// Month containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month `n` calendar months before this one
    pub fn months_back(&self, n: u32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) - n as i32;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidData(format!("Invalid month key (expected YYYY-MM): {}", s));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// A single expense event extracted from a user query
///
/// Amounts are stored as JSON numbers, which pass through `f64`. Values with
/// up to 15 significant digits read back exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub item: String,
    pub amount: Decimal,
}

impl ExpenseRecord {
    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// Rolling per-month ledger entry, overwritten on every expense in the month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: MonthKey,
    pub total_expenses: Decimal,
    pub income: Decimal,
    /// Never negative: `max(income - total_expenses, 0)`
    pub savings: Decimal,
    #[serde(default)]
    pub invested: bool,
}

impl MonthlySummary {
    pub fn compute(month: MonthKey, total_expenses: Decimal, income: Decimal) -> Self {
        Self {
            month,
            total_expenses,
            income,
            savings: (income - total_expenses).max(Decimal::ZERO),
            invested: false,
        }
    }
}

/// One row of the generated savings-plan table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsStep {
    #[serde(default, deserialize_with = "lenient::step_number")]
    pub step_number: u32,
    #[serde(default, deserialize_with = "lenient::text")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub estimated_savings: Decimal,
    #[serde(default, deserialize_with = "lenient::text")]
    pub timeline: String,
}

/// Order a savings plan by its declared step numbers, then renumber 1..N
pub fn normalize_savings_plan(mut steps: Vec<SavingsStep>) -> Vec<SavingsStep> {
    // Stable sort keeps generation order for ties and unnumbered rows
    steps.sort_by_key(|s| if s.step_number == 0 { u32::MAX } else { s.step_number });
    for (i, step) in steps.iter_mut().enumerate() {
        step.step_number = i as u32 + 1;
    }
    steps
}

/// Per-expense analysis, written to `reports/{month}/{date}.json`
///
/// Also the body of a successful query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub category: String,
    pub budget_tips: String,
    pub savings_plan: Vec<SavingsStep>,
    pub investment_suggestions: String,
}

/// Investment history entry, written to `investments/{date}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub total_savings: Decimal,
    pub months_checked: u32,
    pub investment_suggestions: String,
}

/// Result of the expense extraction call
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub expense: ExpenseRecord,
    pub category: String,
    pub budget_tips: String,
    pub savings_plan: Vec<SavingsStep>,
    /// Placeholder until the trailing-window trigger replaces it
    pub investment_suggestions: String,
}

/// Totals gathered from the trailing months' summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowScan {
    pub total_savings: Decimal,
    pub months_checked: u32,
}

impl WindowScan {
    /// Whether enough uninvested savings accumulated to ask for suggestions
    pub fn triggers(&self, min_months: u32) -> bool {
        self.months_checked >= min_months && self.total_savings > Decimal::ZERO
    }
}

/// Everything one recorded expense produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerOutcome {
    pub expense: ExpenseRecord,
    pub summary: MonthlySummary,
    pub scan: WindowScan,
    /// Whether the investment-advice call was made
    pub advice_requested: bool,
    /// Whether an investment history entry was written
    pub investment_recorded: bool,
    pub report: Report,
}

/// Tolerant readers for generated fields
///
/// Generated JSON drifts in shape (lists instead of strings, amounts with
/// currency text), so these accept the common variants.
pub(crate) mod lenient {
    use super::*;

    /// String as-is, list items joined by newlines, null as `None`
    pub fn text_from_value(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(text_from_value)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            other => Some(other.to_string()),
        }
    }

    /// Exact decimal from a JSON number or a numeric string ("₹1,200", "500 INR")
    pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
        match value {
            Value::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok(),
            Value::String(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                Decimal::from_str(&cleaned).ok()
            }
            _ => None,
        }
    }

    pub fn text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(text_from_value(value).unwrap_or_default())
    }

    pub fn amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(decimal_from_value(&value).unwrap_or(Decimal::ZERO))
    }

    pub fn step_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let number = match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        Ok(number.and_then(|n| u32::try_from(n).ok()).unwrap_or(0))
    }
}
