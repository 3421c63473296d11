//! Application facade
//!
//! Wires the record store, display preferences, the dashboard cache and the
//! AI gateway together the way a front end consumes them.

use crate::analytics::memo::{AggregateCache, DerivedAggregates};
use crate::export::{self, ExportWindow};
use crate::filter::{self, ListFilter, ListQuery};
use crate::gateway::{AiGateway, Conversation, ConversationSeed};
use crate::models::{Currency, Transaction, TransactionDraft, TransactionId};
use crate::sample;
use crate::state::{KeyValueStore, Preferences};
use crate::store::{RecordStore, Snapshot};
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{error, info};

pub struct FinanceApp {
    storage: Arc<dyn KeyValueStore>,
    store: RecordStore,
    preferences: Preferences,
    cache: AggregateCache,
    query: ListQuery,
    gateway: AiGateway,
}

impl FinanceApp {
    pub fn open(storage: Arc<dyn KeyValueStore>, gateway: AiGateway) -> Self {
        let store = RecordStore::open(Arc::clone(&storage));
        let preferences = Preferences::load(storage.as_ref());

        info!(
            records = store.len(),
            currency = %preferences.currency,
            ai = gateway.is_configured(),
            "Finance app ready"
        );

        Self {
            storage,
            store,
            preferences,
            cache: AggregateCache::new(),
            query: ListQuery::default(),
            gateway,
        }
    }

    /// Fill an empty store with demo data. Returns whether anything was added.
    pub fn seed_if_empty(&mut self, today: NaiveDate) -> bool {
        if !self.store.is_empty() {
            return false;
        }
        self.store.replace_all(sample::demo_transactions(today));
        true
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    pub fn records(&self) -> Snapshot {
        self.store.list()
    }

    pub fn add(&mut self, draft: TransactionDraft) -> Transaction {
        self.store.add(draft)
    }

    pub fn update(&mut self, id: TransactionId, draft: TransactionDraft) -> Result<Transaction> {
        self.store.update(id, draft)
    }

    pub fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        self.store.remove(id)
    }

    /// Aggregates for the current snapshot, recomputed only after a mutation
    /// or when the day changes.
    pub fn dashboard(&mut self, today: NaiveDate) -> Arc<DerivedAggregates> {
        let snapshot = self.store.list();
        self.cache.get(&snapshot, today)
    }

    pub fn set_query(&mut self, query: ListQuery) {
        self.query = query;
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Records matching the current filter and search text, in store order.
    pub fn visible_records(&self) -> Vec<Transaction> {
        filter::project(&self.store.list(), &self.query)
    }

    pub fn filter_options(&self) -> Vec<ListFilter> {
        filter::available_filters(&self.store.list())
    }

    pub fn export_csv(&self, window: ExportWindow, today: NaiveDate) -> Result<String> {
        export::to_csv(&self.store.list(), window, today)
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn set_currency(&mut self, currency: Currency) -> Result<()> {
        self.preferences.currency = currency;
        self.save_preferences()
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) -> Result<()> {
        self.preferences.dark_mode = dark_mode;
        self.save_preferences()
    }

    /// Signed amount in the selected currency, e.g. `-₹12.50`.
    pub fn format_amount(&self, transaction: &Transaction) -> String {
        self.preferences
            .currency
            .format_amount(transaction.transaction_type, transaction.amount)
    }

    fn save_preferences(&self) -> Result<()> {
        self.preferences.save(self.storage.as_ref()).map_err(|e| {
            error!("Failed to persist preferences: {}", e);
            e
        })
    }

    pub fn gateway(&self) -> &AiGateway {
        &self.gateway
    }

    pub async fn summarize(&self) -> Result<String> {
        self.gateway.summarize(&self.store.list()).await
    }

    /// Chat about the records as they are right now. Later edits are not seen
    /// by an already open conversation.
    pub fn open_chat(&self) -> Result<Conversation> {
        self.gateway
            .open_conversation(ConversationSeed::Transactions(self.store.list().to_vec()))
    }
}
