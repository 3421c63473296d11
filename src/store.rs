//! Record store
//!
//! Owns the ordered transaction list. Every mutation produces a new snapshot
//! (the previous `Arc` is never mutated), rewrites the persisted copy and
//! notifies subscribers, in that order.

use crate::error::TrackerError;
use crate::models::{Transaction, TransactionDraft, TransactionId};
use crate::state::{load_json, save_json, KeyValueStore, TRANSACTIONS_KEY};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Immutable view of the records at one point in time, newest date first.
pub type Snapshot = Arc<Vec<Transaction>>;

pub type Observer = Box<dyn FnMut(&Snapshot) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct RecordStore {
    records: Snapshot,
    /// Creation order per record; higher is newer. Breaks same-date ties.
    sequence: HashMap<TransactionId, u64>,
    next_sequence: u64,
    storage: Arc<dyn KeyValueStore>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl RecordStore {
    /// Load the persisted snapshot. Missing or malformed data yields an empty store.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let loaded: Vec<Transaction> =
            load_json(storage.as_ref(), TRANSACTIONS_KEY).unwrap_or_default();

        let mut store = Self {
            records: Arc::new(Vec::new()),
            sequence: HashMap::new(),
            next_sequence: 1,
            storage,
            observers: Vec::new(),
            next_subscription: 1,
        };
        store.install(loaded);

        info!(count = store.records.len(), "Record store opened");
        store
    }

    /// Replace every record, e.g. when seeding demo data. Persists and notifies.
    pub fn replace_all(&mut self, records: Vec<Transaction>) {
        self.install(records);
        info!(count = self.records.len(), "Record store replaced");
        self.persist();
        self.notify();
    }

    /// Earlier positions in `records` count as newer, matching how a sorted
    /// snapshot is laid out.
    fn install(&mut self, records: Vec<Transaction>) {
        self.sequence.clear();
        let total = records.len() as u64;
        let mut unique = Vec::with_capacity(records.len());

        for (index, tx) in records.into_iter().enumerate() {
            if self.sequence.contains_key(&tx.id) {
                warn!(id = %tx.id, "Dropping duplicate record id from snapshot");
                continue;
            }
            self.sequence.insert(tx.id, total - index as u64);
            unique.push(tx);
        }

        self.next_sequence = total + 1;
        self.sort_into_snapshot(unique);
    }

    pub fn add(&mut self, draft: TransactionDraft) -> Transaction {
        let id = TransactionId::new();
        let transaction = Transaction::from_draft(id, draft);

        self.sequence.insert(id, self.next_sequence);
        self.next_sequence += 1;

        let mut next = Vec::with_capacity(self.records.len() + 1);
        next.push(transaction.clone());
        next.extend(self.records.iter().cloned());

        debug!(id = %id, date = %transaction.date, "Transaction added");
        self.commit(next);
        transaction
    }

    /// Replace the record with `id`. An unknown id changes nothing.
    pub fn update(&mut self, id: TransactionId, draft: TransactionDraft) -> Result<Transaction> {
        let Some(position) = self.records.iter().position(|t| t.id == id) else {
            warn!(id = %id, "Update ignored, transaction not found");
            return Err(TrackerError::NotFound(id.to_string()));
        };

        let replacement = Transaction::from_draft(id, draft);
        let mut next = self.records.as_ref().clone();
        next[position] = replacement.clone();

        debug!(id = %id, "Transaction updated");
        self.commit(next);
        Ok(replacement)
    }

    /// Delete the record with `id`, returning it. An unknown id changes nothing.
    pub fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        let Some(position) = self.records.iter().position(|t| t.id == id) else {
            warn!(id = %id, "Remove ignored, transaction not found");
            return None;
        };

        let mut next = self.records.as_ref().clone();
        let removed = next.remove(position);
        self.sequence.remove(&id);

        debug!(id = %id, "Transaction removed");
        self.commit(next);
        Some(removed)
    }

    pub fn list(&self) -> Snapshot {
        Arc::clone(&self.records)
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.records.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn commit(&mut self, records: Vec<Transaction>) {
        self.sort_into_snapshot(records);
        self.persist();
        self.notify();
    }

    fn sort_into_snapshot(&mut self, mut records: Vec<Transaction>) {
        let sequence = &self.sequence;
        records.sort_by(|a, b| {
            b.date.cmp(&a.date).then_with(|| {
                let sa = sequence.get(&a.id).copied().unwrap_or(0);
                let sb = sequence.get(&b.id).copied().unwrap_or(0);
                sb.cmp(&sa)
            })
        });
        self.records = Arc::new(records);
    }

    /// Failures are logged only; the in-memory snapshot stays authoritative.
    fn persist(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), TRANSACTIONS_KEY, self.records.as_slice()) {
            error!(error = %e, count = self.records.len(), "Failed to persist record snapshot");
        }
    }

    fn notify(&mut self) {
        let snapshot = Arc::clone(&self.records);
        for (_, observer) in self.observers.iter_mut() {
            observer(&snapshot);
        }
    }
}
