//! Transaction form state and validation
//!
//! Raw field values come in as typed by the user; `validate` is the only way to
//! obtain a `TransactionDraft`, so the store never sees malformed input.

use crate::error::TrackerError;
use crate::models::{Category, Transaction, TransactionDraft, TransactionType, MIN_AMOUNT};
use crate::Result;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub description: String,
    pub amount: String,
    pub transaction_type: TransactionType,
    pub category: Category,
    pub date: String,
}

impl TransactionForm {
    /// Blank form: an Expense dated `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            description: String::new(),
            amount: String::new(),
            transaction_type: TransactionType::Expense,
            category: TransactionType::Expense.default_category(),
            date: today.format("%Y-%m-%d").to_string(),
        }
    }

    /// Form pre-filled for editing an existing record.
    pub fn prefill_from(transaction: &Transaction) -> Self {
        Self {
            description: transaction.description.clone(),
            amount: transaction.amount.to_string(),
            transaction_type: transaction.transaction_type,
            category: transaction.category,
            date: transaction.date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Switch type; the category always resets to the new type's first category.
    pub fn set_type(&mut self, transaction_type: TransactionType) {
        self.transaction_type = transaction_type;
        self.category = transaction_type.default_category();
    }

    pub fn category_options(&self) -> &'static [Category] {
        self.transaction_type.categories()
    }

    pub fn validate(&self) -> Result<TransactionDraft> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(TrackerError::validation("description", "is required"));
        }

        let amount = parse_amount(&self.amount)?;

        if !self.category.is_allowed_for(self.transaction_type) {
            return Err(TrackerError::validation(
                "category",
                format!(
                    "{} is not a valid {} category",
                    self.category, self.transaction_type
                ),
            ));
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|e| {
            TrackerError::validation("date", format!("expected YYYY-MM-DD ({})", e))
        })?;

        Ok(TransactionDraft {
            description: description.to_string(),
            amount,
            transaction_type: self.transaction_type,
            category: self.category,
            date,
        })
    }
}

fn parse_amount(raw: &str) -> Result<f64> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| TrackerError::validation("amount", "must be a number"))?;

    if !amount.is_finite() {
        return Err(TrackerError::validation("amount", "must be a finite number"));
    }

    if amount < MIN_AMOUNT {
        return Err(TrackerError::validation(
            "amount",
            format!("must be at least {}", MIN_AMOUNT),
        ));
    }

    Ok(amount)
}
