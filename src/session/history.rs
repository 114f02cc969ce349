//! Bounded in-memory record of finalized utterances.

use crate::session::transcript::Direction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// One finalized utterance.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TranscriptionEntry {
    pub id: Uuid,
    pub direction: Direction,
    pub text: String,
    /// BCP-47 language tag guessed from the text ("ko" or "en").
    pub language: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptionEntry {
    pub fn new(direction: Direction, text: String, language: &'static str) -> Self {
        Self {
            id: Uuid::new_v4(),
            direction,
            text,
            language,
            timestamp: Utc::now(),
        }
    }
}

/// FIFO store holding the most recent entries up to a fixed limit.
pub struct HistoryStore {
    entries: VecDeque<TranscriptionEntry>,
    limit: usize,
}

impl HistoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Append an entry, evicting the oldest when the store is full.
    pub fn append(&mut self, entry: TranscriptionEntry) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest-first.
    pub fn snapshot(&self) -> Vec<TranscriptionEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(crate::defaults::HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang;

    fn entry(text: &str) -> TranscriptionEntry {
        TranscriptionEntry::new(Direction::Incoming, text.to_string(), lang::ENGLISH)
    }

    #[test]
    fn append_preserves_order() {
        let mut store = HistoryStore::new(10);
        store.append(entry("first"));
        store.append(entry("second"));
        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].text, "first");
        assert_eq!(snapshot[1].text, "second");
    }

    #[test]
    fn oldest_entry_evicted_at_limit() {
        let mut store = HistoryStore::new(3);
        for i in 0..5 {
            store.append(entry(&format!("utterance {}", i)));
        }
        assert_eq!(store.len(), 3);
        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].text, "utterance 2");
        assert_eq!(snapshot[2].text, "utterance 4");
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = HistoryStore::new(3);
        store.append(entry("something"));
        assert!(!store.is_empty());
        store.clear();
        assert!(store.is_empty());
        // Still usable after clearing
        store.append(entry("again"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn entries_get_distinct_ids() {
        let a = entry("a");
        let b = entry("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn default_limit_is_fifty() {
        let mut store = HistoryStore::default();
        for i in 0..60 {
            store.append(entry(&format!("{}", i)));
        }
        assert_eq!(store.len(), 50);
    }
}
