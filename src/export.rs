//! CSV export of the record list

use crate::models::Transaction;
use crate::Result;
use chrono::{Duration, Months, NaiveDate};
use csv::{QuoteStyle, WriterBuilder};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportWindow {
    Last30Days,
    Last90Days,
    LastYear,
    Last3Years,
    Last5Years,
    #[default]
    All,
}

impl ExportWindow {
    /// Earliest date included, or `None` for no limit.
    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            ExportWindow::Last30Days => Some(today - Duration::days(30)),
            ExportWindow::Last90Days => Some(today - Duration::days(90)),
            ExportWindow::LastYear => today.checked_sub_months(Months::new(12)),
            ExportWindow::Last3Years => today.checked_sub_months(Months::new(36)),
            ExportWindow::Last5Years => today.checked_sub_months(Months::new(60)),
            ExportWindow::All => None,
        }
    }
}

impl FromStr for ExportWindow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "30d" => Ok(ExportWindow::Last30Days),
            "90d" => Ok(ExportWindow::Last90Days),
            "1y" => Ok(ExportWindow::LastYear),
            "3y" => Ok(ExportWindow::Last3Years),
            "5y" => Ok(ExportWindow::Last5Years),
            "all" => Ok(ExportWindow::All),
            other => Err(format!("unknown export window '{}'", other)),
        }
    }
}

/// Render records inside `window` as CSV, preserving their order.
pub fn to_csv(records: &[Transaction], window: ExportWindow, today: NaiveDate) -> Result<String> {
    let cutoff = window.cutoff(today);

    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    wtr.write_record(["ID", "Description", "Amount", "Type", "Category", "Date"])?;

    let mut rows = 0usize;
    for t in records.iter().filter(|t| cutoff.map_or(true, |c| t.date >= c)) {
        wtr.write_record([
            t.id.to_string(),
            t.description.clone(),
            format!("{:.2}", t.amount),
            t.transaction_type.to_string(),
            t.category.to_string(),
            t.date.format("%Y-%m-%d").to_string(),
        ])?;
        rows += 1;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    info!(rows, ?window, "Exported transactions to CSV");

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, TransactionId, TransactionType};

    fn tx(description: &str, date: NaiveDate) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            description: description.to_string(),
            amount: 12.5,
            transaction_type: TransactionType::Expense,
            category: Category::Shopping,
            date,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_header_and_quoting() {
        let records = vec![tx("12\" \"pizza\"", day(2024, 6, 1))];
        let out = to_csv(&records, ExportWindow::All, day(2024, 6, 2)).unwrap();
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "\"ID\",\"Description\",\"Amount\",\"Type\",\"Category\",\"Date\""
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"12\"\" \"\"pizza\"\"\""));
        assert!(row.contains(",12.50,"));
        assert!(row.ends_with("\"2024-06-01\""));
    }

    #[test]
    fn test_window_filters_old_records() {
        let today = day(2024, 6, 30);
        let records = vec![
            tx("recent", day(2024, 6, 1)),
            tx("boundary", day(2024, 5, 31)),
            tx("old", day(2024, 1, 1)),
            tx("ancient", day(2018, 1, 1)),
        ];

        let out = to_csv(&records, ExportWindow::Last30Days, today).unwrap();
        assert!(out.contains("boundary"));
        assert!(!out.contains("old"));

        let out = to_csv(&records, ExportWindow::LastYear, today).unwrap();
        assert!(out.contains("\"old\""));
        assert!(!out.contains("ancient"));

        let out = to_csv(&records, ExportWindow::All, today).unwrap();
        assert_eq!(out.lines().count(), 5);
    }

    #[test]
    fn test_parse_windows() {
        assert_eq!("90d".parse::<ExportWindow>(), Ok(ExportWindow::Last90Days));
        assert_eq!("ALL".parse::<ExportWindow>(), Ok(ExportWindow::All));
        assert!("2w".parse::<ExportWindow>().is_err());
    }
}
