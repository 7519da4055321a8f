//! Expense extraction
//!
//! One generation call turns a free-text query into an [`ExpenseRecord`] plus
//! the advisory fields shown back to the user. The generated text must be a
//! single JSON object; see [`parsing::parse_strict_json`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::ai::{parsing, AIBackend, AIClient};
use crate::error::{Error, ExtractionError, Result};
use crate::models::lenient::{decimal_from_value, text_from_value};
use crate::models::{normalize_savings_plan, Extraction, ExpenseRecord, SavingsStep};
use crate::prompts::{PromptId, PromptLibrary};

pub const DEFAULT_CATEGORY: &str = "Unknown";
pub const DEFAULT_BUDGET_TIPS: &str = "No tips provided";
pub const DEFAULT_INVESTMENT_SUGGESTIONS: &str = "No investment suggestions";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Turns user queries into structured expenses via the generation backend
#[derive(Clone)]
pub struct ExpenseExtractor {
    ai: AIClient,
    prompts: Arc<RwLock<PromptLibrary>>,
    currency: String,
    max_tokens: u32,
}

impl ExpenseExtractor {
    pub fn new(
        ai: AIClient,
        prompts: Arc<RwLock<PromptLibrary>>,
        currency: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            ai,
            prompts,
            currency: currency.into(),
            max_tokens,
        }
    }

    /// Extract an expense from `query`, defaulting its date to `yesterday`
    pub async fn extract(&self, query: &str, yesterday: NaiveDate) -> Result<Extraction> {
        let yesterday_str = yesterday.format(DATE_FORMAT).to_string();
        let prompt = {
            let mut prompts = self
                .prompts
                .write()
                .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
            let mut vars = HashMap::new();
            vars.insert("query", query);
            vars.insert("yesterday", yesterday_str.as_str());
            vars.insert("currency", self.currency.as_str());
            prompts.render(PromptId::ExtractExpense, &vars)?
        };

        debug!(model = self.ai.model(), "Requesting expense extraction");
        let text = self.ai.generate(&prompt, self.max_tokens).await?;
        debug!("Extraction response: {}", text);

        Ok(parse_extraction(&text, yesterday)?)
    }
}

/// Interpret generated text as an extraction
///
/// Fails with `MalformedJson` when the text is not one JSON object and with
/// `MissingField` when `expense` is absent or falsy. Advisory fields fall
/// back to fixed defaults.
pub fn parse_extraction(
    text: &str,
    yesterday: NaiveDate,
) -> std::result::Result<Extraction, ExtractionError> {
    let mut map = parsing::parse_strict_json(text)?;

    let expense_value = match map.remove("expense") {
        Some(value) if is_truthy(&value) => value,
        _ => {
            return Err(ExtractionError::MissingField {
                field: "expense",
                raw: text.to_string(),
            })
        }
    };
    let expense = parse_expense(expense_value, yesterday).map_err(|detail| {
        ExtractionError::InvalidField {
            field: "expense",
            detail,
            raw: text.to_string(),
        }
    })?;

    let category = take_text(&mut map, "category").unwrap_or_else(|| DEFAULT_CATEGORY.into());
    let budget_tips =
        take_text(&mut map, "budget_tips").unwrap_or_else(|| DEFAULT_BUDGET_TIPS.into());
    let investment_suggestions = take_text(&mut map, "investment_suggestions")
        .unwrap_or_else(|| DEFAULT_INVESTMENT_SUGGESTIONS.into());
    let savings_plan = parse_savings_plan(map.remove("savings_plan"));

    Ok(Extraction {
        expense,
        category,
        budget_tips,
        savings_plan,
        investment_suggestions,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn parse_expense(value: Value, yesterday: NaiveDate) -> std::result::Result<ExpenseRecord, String> {
    let Value::Object(mut fields) = value else {
        return Err("expected an object".into());
    };

    let date = match fields.remove("date") {
        None | Some(Value::Null) => yesterday,
        Some(Value::String(s)) if s.trim().is_empty() => yesterday,
        Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|e| format!("invalid date {:?}: {}", s, e))?,
        Some(other) => return Err(format!("invalid date {}", other)),
    };

    let amount = fields
        .get("amount")
        .and_then(decimal_from_value)
        .ok_or_else(|| match fields.get("amount") {
            Some(v) => format!("invalid amount {}", v),
            None => "missing amount".to_string(),
        })?;
    if amount < Decimal::ZERO {
        return Err(format!("amount must not be negative, got {}", amount));
    }
    // The month total counts the current amount twice
    if amount.checked_add(amount).is_none() {
        return Err(format!("amount {} is too large", amount));
    }

    let item = fields
        .remove("item")
        .and_then(text_from_value)
        .unwrap_or_default();

    Ok(ExpenseRecord { date, item, amount })
}

fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    map.remove(key).and_then(text_from_value)
}

fn parse_savings_plan(value: Option<Value>) -> Vec<SavingsStep> {
    let Some(Value::Array(rows)) = value else {
        return Vec::new();
    };

    let steps = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<SavingsStep>(row) {
            Ok(step) => Some(step),
            Err(e) => {
                warn!("Skipping malformed savings plan row: {}", e);
                None
            }
        })
        .collect();

    normalize_savings_plan(steps)
}
