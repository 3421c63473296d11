//! List filter and search projection

use crate::models::{Category, Transaction, TransactionType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Type(TransactionType),
    Category(Category),
}

impl ListFilter {
    /// Parse a filter option label. Type names win over category names;
    /// anything unrecognised falls back to `All`.
    pub fn parse(label: &str) -> Self {
        if let Ok(t) = label.parse::<TransactionType>() {
            return ListFilter::Type(t);
        }
        if let Ok(c) = label.parse::<Category>() {
            return ListFilter::Category(c);
        }
        ListFilter::All
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Type(t) => transaction.transaction_type == *t,
            ListFilter::Category(c) => transaction.category == *c,
        }
    }
}

impl fmt::Display for ListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListFilter::All => write!(f, "All"),
            ListFilter::Type(t) => write!(f, "{}", t),
            ListFilter::Category(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: ListFilter,
    pub search_text: String,
}

impl ListQuery {
    pub fn new(filter: ListFilter, search_text: impl Into<String>) -> Self {
        Self {
            filter,
            search_text: search_text.into(),
        }
    }
}

pub fn project(records: &[Transaction], query: &ListQuery) -> Vec<Transaction> {
    let needle = query.search_text.to_lowercase();
    records
        .iter()
        .filter(|t| query.filter.matches(t))
        .filter(|t| t.description.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Filter options for the list: All, both types, then categories in the order
/// they first appear in `records`.
pub fn available_filters(records: &[Transaction]) -> Vec<ListFilter> {
    let mut options = vec![
        ListFilter::All,
        ListFilter::Type(TransactionType::Income),
        ListFilter::Type(TransactionType::Expense),
    ];

    for t in records {
        let option = ListFilter::Category(t.category);
        if !options.contains(&option) {
            options.push(option);
        }
    }

    options
}
