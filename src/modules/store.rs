//! In-memory record store shared by the modules.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Concurrent map from record ID to record, remembering insertion order.
pub struct Store<T> {
    records: DashMap<String, (u64, T)>,
    next_seq: AtomicU64,
}

impl<T: Clone> Store<T> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn insert(&self, id: String, record: T) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.records.insert(id, (seq, record));
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.records.get(id).map(|entry| entry.value().1.clone())
    }

    /// Up to `limit` records, oldest first.
    pub fn list(&self, limit: usize) -> Vec<T> {
        let mut entries: Vec<(u64, T)> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().take(limit).map(|(_, record)| record).collect()
    }
}

impl<T: Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh record ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_keeps_insertion_order_and_limit() {
        let store = Store::new();
        for n in 0..5 {
            store.insert(format!("id-{n}"), n);
        }

        assert_eq!(store.list(3), vec![0, 1, 2]);
        assert_eq!(store.list(10).len(), 5);
        assert_eq!(store.get("id-4"), Some(4));
        assert_eq!(store.get("missing"), None);
    }
}
