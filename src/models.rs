//! Core data models for the finance tracker

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Smallest amount a form will accept.
pub const MIN_AMOUNT: f64 = 0.01;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Travel,
    Shopping,
    Utilities,
    Entertainment,
    Health,
    Salary,
    Freelance,
    Investments,
    Other,
}

pub const EXPENSE_CATEGORIES: &[Category] = &[
    Category::Food,
    Category::Travel,
    Category::Shopping,
    Category::Utilities,
    Category::Entertainment,
    Category::Health,
    Category::Other,
];

pub const INCOME_CATEGORIES: &[Category] = &[
    Category::Salary,
    Category::Freelance,
    Category::Investments,
    Category::Other,
];

impl TransactionType {
    pub const ALL: [TransactionType; 2] = [TransactionType::Income, TransactionType::Expense];

    /// Categories a record of this type may carry, in form display order.
    pub fn categories(self) -> &'static [Category] {
        match self {
            TransactionType::Income => INCOME_CATEGORIES,
            TransactionType::Expense => EXPENSE_CATEGORIES,
        }
    }

    /// Category a form falls back to whenever the type is switched.
    pub fn default_category(self) -> Category {
        self.categories()[0]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl Category {
    pub fn is_allowed_for(self, transaction_type: TransactionType) -> bool {
        transaction_type.categories().contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Shopping => "Shopping",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Salary => "Salary",
            Category::Freelance => "Freelance",
            Category::Investments => "Investments",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown transaction type '{}'", s))
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EXPENSE_CATEGORIES
            .iter()
            .chain(INCOME_CATEGORIES.iter())
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

//
// ================= Transaction =================
//

/// Opaque record identifier. Fresh for every created record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated transaction that has not been assigned an identity yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: Category,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: Category,
    pub date: NaiveDate,
}

impl Transaction {
    pub fn from_draft(id: TransactionId, draft: TransactionDraft) -> Self {
        Self {
            id,
            description: draft.description,
            amount: draft.amount,
            transaction_type: draft.transaction_type,
            category: draft.category,
            date: draft.date,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    pub fn to_draft(&self) -> TransactionDraft {
        TransactionDraft {
            description: self.description.clone(),
            amount: self.amount,
            transaction_type: self.transaction_type,
            category: self.category,
            date: self.date,
        }
    }
}

//
// ================= Preferences =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Inr,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Inr => "₹",
        }
    }

    /// Signed list rendering, e.g. `+$5000.00` or `-₹20.00`.
    pub fn format_amount(self, transaction_type: TransactionType, amount: f64) -> String {
        let sign = match transaction_type {
            TransactionType::Income => '+',
            TransactionType::Expense => '-',
        };
        format!("{}{}{:.2}", sign, self.symbol(), amount)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_sets_share_only_other() {
        let shared: Vec<_> = EXPENSE_CATEGORIES
            .iter()
            .filter(|c| INCOME_CATEGORIES.contains(c))
            .collect();
        assert_eq!(shared, vec![&Category::Other]);
    }

    #[test]
    fn test_default_category_per_type() {
        assert_eq!(TransactionType::Expense.default_category(), Category::Food);
        assert_eq!(TransactionType::Income.default_category(), Category::Salary);
        assert!(!Category::Salary.is_allowed_for(TransactionType::Expense));
    }

    #[test]
    fn test_transaction_wire_format() {
        let tx = Transaction::from_draft(
            TransactionId::new(),
            TransactionDraft {
                description: "Groceries".to_string(),
                amount: 42.5,
                transaction_type: TransactionType::Expense,
                category: Category::Food,
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            },
        );

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "Expense");
        assert_eq!(json["category"], "Food");
        assert_eq!(json["date"], "2024-01-02");
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_parse_names_case_insensitively() {
        assert_eq!("income".parse::<TransactionType>(), Ok(TransactionType::Income));
        assert_eq!("FOOD".parse::<Category>(), Ok(Category::Food));
        assert!("Rent".parse::<Category>().is_err());
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::Usd.format_amount(TransactionType::Income, 5000.0), "+$5000.00");
        assert_eq!(Currency::Inr.format_amount(TransactionType::Expense, 20.0), "-₹20.00");
        assert_eq!(serde_json::to_string(&Currency::Inr).unwrap(), "\"INR\"");
    }
}
