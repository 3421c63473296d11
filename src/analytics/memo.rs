//! Memoized dashboard aggregates
//!
//! Snapshots are replaced wholesale on every store mutation, so pointer
//! identity of the `Arc` is a sufficient cache key.

use super::{category_breakdown, totals, trend, trend_chart, CategoryTotal, ChartPoint, Totals, TrendPoint, TREND_WINDOW_DAYS};
use crate::models::TransactionType;
use crate::store::Snapshot;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Everything the dashboard renders, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedAggregates {
    pub totals: Totals,
    pub expense_breakdown: Vec<CategoryTotal>,
    pub trend: Vec<TrendPoint>,
    pub trend_chart: Vec<ChartPoint>,
}

impl DerivedAggregates {
    pub fn compute(records: &Snapshot, reference_date: NaiveDate) -> Self {
        let trend = trend(records, TREND_WINDOW_DAYS, reference_date);
        Self {
            totals: totals(records),
            expense_breakdown: category_breakdown(records, TransactionType::Expense),
            trend_chart: trend_chart(&trend),
            trend,
        }
    }
}

struct CacheEntry {
    snapshot: Snapshot,
    reference_date: NaiveDate,
    aggregates: Arc<DerivedAggregates>,
}

#[derive(Default)]
pub struct AggregateCache {
    entry: Option<CacheEntry>,
    computations: usize,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, snapshot: &Snapshot, reference_date: NaiveDate) -> Arc<DerivedAggregates> {
        if let Some(entry) = &self.entry {
            if Arc::ptr_eq(&entry.snapshot, snapshot) && entry.reference_date == reference_date {
                return Arc::clone(&entry.aggregates);
            }
        }

        debug!(records = snapshot.len(), %reference_date, "Recomputing aggregates");
        let aggregates = Arc::new(DerivedAggregates::compute(snapshot, reference_date));
        self.computations += 1;
        self.entry = Some(CacheEntry {
            snapshot: Arc::clone(snapshot),
            reference_date,
            aggregates: Arc::clone(&aggregates),
        });
        aggregates
    }

    /// Number of times aggregates were actually recomputed.
    pub fn computations(&self) -> usize {
        self.computations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Transaction, TransactionId};

    fn snapshot(amount: f64) -> Snapshot {
        Arc::new(vec![Transaction {
            id: TransactionId::new(),
            description: "Groceries".to_string(),
            amount,
            transaction_type: TransactionType::Expense,
            category: Category::Food,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }])
    }

    #[test]
    fn test_same_snapshot_hits_cache() {
        let mut cache = AggregateCache::new();
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let snap = snapshot(10.0);

        let first = cache.get(&snap, today);
        let second = cache.get(&Arc::clone(&snap), today);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.computations(), 1);
        assert_eq!(first.totals.expenses, 10.0);
        assert_eq!(first.trend_chart[0].label, "May 1");
    }

    #[test]
    fn test_new_snapshot_or_day_recomputes() {
        let mut cache = AggregateCache::new();
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        cache.get(&snapshot(10.0), today);
        let equal_content = cache.get(&snapshot(10.0), today);
        assert_eq!(cache.computations(), 2);

        let snap = snapshot(10.0);
        cache.get(&snap, today);
        let later = cache.get(&snap, today + chrono::Duration::days(60));
        assert_eq!(cache.computations(), 4);
        assert!(later.trend.is_empty());
        assert_eq!(equal_content.totals.expenses, 10.0);
    }
}
