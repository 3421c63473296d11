//! Aggregation engine
//!
//! Pure functions over a record slice. Nothing here is incremental: every
//! figure is recomputed from the records it is given.

pub mod memo;

pub use memo::{AggregateCache, DerivedAggregates};

use crate::models::{Category, Transaction, TransactionType};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Trailing window used by the dashboard trend chart.
pub const TREND_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Totals {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Bar chart entry with its display label, e.g. `"Jan 5"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub amount: f64,
}

pub fn totals(records: &[Transaction]) -> Totals {
    let (income, expenses) = records.iter().fold((0.0, 0.0), |(inc, exp), t| {
        match t.transaction_type {
            TransactionType::Income => (inc + t.amount, exp),
            TransactionType::Expense => (inc, exp + t.amount),
        }
    });

    Totals {
        income,
        expenses,
        balance: income - expenses,
    }
}

/// Sum per category for one type, largest first. Equal sums keep the order in
/// which their categories were first encountered.
pub fn category_breakdown(records: &[Transaction], transaction_type: TransactionType) -> Vec<CategoryTotal> {
    let mut sums: Vec<CategoryTotal> = Vec::new();

    for t in records.iter().filter(|t| t.transaction_type == transaction_type) {
        match sums.iter_mut().find(|c| c.category == t.category) {
            Some(entry) => entry.amount += t.amount,
            None => sums.push(CategoryTotal {
                category: t.category,
                amount: t.amount,
            }),
        }
    }

    // sort_by is stable
    sums.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    sums
}

/// Daily expense sums for dates on or after `reference_date - window_days`,
/// oldest first.
pub fn trend(records: &[Transaction], window_days: i64, reference_date: NaiveDate) -> Vec<TrendPoint> {
    let cutoff = reference_date - Duration::days(window_days);

    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for t in records.iter().filter(|t| t.is_expense() && t.date >= cutoff) {
        *daily.entry(t.date).or_insert(0.0) += t.amount;
    }

    daily
        .into_iter()
        .map(|(date, amount)| TrendPoint { date, amount })
        .collect()
}

/// Format trend points as chart labels and order them by the label's
/// month and day. The label carries no year, so a window spanning New Year
/// places January buckets ahead of December ones.
pub fn trend_chart(points: &[TrendPoint]) -> Vec<ChartPoint> {
    let mut labelled: Vec<((u32, u32), ChartPoint)> = points
        .iter()
        .map(|p| {
            (
                (p.date.month(), p.date.day()),
                ChartPoint {
                    label: p.date.format("%b %-d").to_string(),
                    amount: p.amount,
                },
            )
        })
        .collect();

    labelled.sort_by_key(|(month_day, _)| *month_day);
    labelled.into_iter().map(|(_, point)| point).collect()
}
