//! Demo data for an empty store

use crate::models::{Category, Transaction, TransactionId, TransactionType};
use chrono::{Duration, NaiveDate};

const DEMO_DAYS: i64 = 30;

/// Amount in `[base, base + spread)` that varies by day but is reproducible.
fn varied(base: f64, spread: f64, day: i64, salt: i64) -> f64 {
    let step = ((day * 37 + salt * 11) % 100) as f64 / 100.0;
    ((base + spread * step) * 100.0).round() / 100.0
}

fn entry(
    description: &str,
    amount: f64,
    transaction_type: TransactionType,
    category: Category,
    date: NaiveDate,
) -> Transaction {
    Transaction {
        id: TransactionId::new(),
        description: description.to_string(),
        amount,
        transaction_type,
        category,
        date,
    }
}

/// Thirty days of activity ending at `today`, newest first: a salary every
/// fifteen days, groceries every third day, fuel every fifth, movies every
/// seventh and a coffee each morning.
pub fn demo_transactions(today: NaiveDate) -> Vec<Transaction> {
    let mut records = Vec::new();

    for day in 0..DEMO_DAYS {
        let date = today - Duration::days(day);

        if day % 15 == 0 {
            records.push(entry("Monthly Salary", 5000.0, TransactionType::Income, Category::Salary, date));
        }
        if day % 3 == 0 {
            records.push(entry("Groceries", varied(20.0, 50.0, day, 1), TransactionType::Expense, Category::Food, date));
        }
        if day % 5 == 0 {
            records.push(entry("Gasoline", varied(15.0, 30.0, day, 2), TransactionType::Expense, Category::Travel, date));
        }
        if day % 7 == 0 {
            records.push(entry(
                "Movie Tickets",
                varied(10.0, 25.0, day, 3),
                TransactionType::Expense,
                Category::Entertainment,
                date,
            ));
        }
        records.push(entry("Morning Coffee", varied(3.0, 5.0, day, 4), TransactionType::Expense, Category::Food, date));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn test_demo_pattern() {
        let records = demo_transactions(today());

        let count = |description: &str| records.iter().filter(|t| t.description == description).count();
        assert_eq!(count("Monthly Salary"), 2);
        assert_eq!(count("Groceries"), 10);
        assert_eq!(count("Gasoline"), 6);
        assert_eq!(count("Movie Tickets"), 5);
        assert_eq!(count("Morning Coffee"), 30);

        assert!(records.windows(2).all(|w| w[0].date >= w[1].date));
        assert_eq!(records[0].date, today());
        assert_eq!(records.last().unwrap().date, today() - Duration::days(29));
    }

    #[test]
    fn test_demo_amounts_are_reproducible_and_in_range() {
        let a = demo_transactions(today());
        let b = demo_transactions(today());
        let amounts = |r: &[Transaction]| r.iter().map(|t| t.amount).collect::<Vec<_>>();
        assert_eq!(amounts(&a), amounts(&b));

        for t in a.iter().filter(|t| t.description == "Morning Coffee") {
            assert!(t.amount >= 3.0 && t.amount < 8.0, "coffee {}", t.amount);
        }
        assert_eq!(analytics::totals(&a).income, 10000.0);
    }
}
