//! Object key layout
//!
//! ```text
//! expenses/{YYYY-MM}/{YYYY-MM-DD}.json   ExpenseRecord
//! savings/{YYYY-MM}/summary.json         MonthlySummary
//! reports/{YYYY-MM}/{YYYY-MM-DD}.json    Report
//! investments/{YYYY-MM-DD}.json          InvestmentRecord
//! ```

use chrono::NaiveDate;

use crate::models::MonthKey;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn expense(date: NaiveDate) -> String {
    format!(
        "{}{}.json",
        expense_prefix(MonthKey::from_date(date)),
        date.format(DATE_FORMAT)
    )
}

/// Prefix listing every expense in a month
pub fn expense_prefix(month: MonthKey) -> String {
    format!("expenses/{}/", month)
}

pub fn summary(month: MonthKey) -> String {
    format!("savings/{}/summary.json", month)
}

pub fn report(date: NaiveDate) -> String {
    format!(
        "reports/{}/{}.json",
        MonthKey::from_date(date),
        date.format(DATE_FORMAT)
    )
}

pub fn investment(date: NaiveDate) -> String {
    format!("investments/{}.json", date.format(DATE_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_layout() {
        let d = date("2024-05-01");
        let month = MonthKey::from_date(d);

        assert_eq!(expense(d), "expenses/2024-05/2024-05-01.json");
        assert_eq!(expense_prefix(month), "expenses/2024-05/");
        assert_eq!(summary(month), "savings/2024-05/summary.json");
        assert_eq!(report(d), "reports/2024-05/2024-05-01.json");
        assert_eq!(investment(d), "investments/2024-05-01.json");
    }

    #[test]
    fn test_expense_key_is_under_its_month_prefix() {
        let d = date("2023-12-31");
        assert!(expense(d).starts_with(&expense_prefix(MonthKey::from_date(d))));
    }
}
