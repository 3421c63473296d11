//! Personal Finance Tracker
//!
//! Core of a single-user income/expense tracker:
//! - Ordered record store persisted as one JSON snapshot
//! - Derived dashboard aggregates (totals, category breakdown, 30-day trend)
//! - Filter/search projection and CSV export
//! - Gemini-backed summaries, content analysis, grounded news and streaming chat
//!
//! DATA FLOW:
//! FORM → DRAFT → STORE → SNAPSHOT → { AGGREGATES | LIST VIEW | AI PROMPT }

pub mod analytics;
pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod form;
pub mod gateway;
pub mod models;
pub mod sample;
pub mod state;
pub mod store;

pub use error::{Result, TrackerError};

// Re-export common types
pub use app::FinanceApp;
pub use models::*;
pub use store::{RecordStore, Snapshot};
