use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Card, PersistenceWarning, StorageError};

/// String blob store keyed by string, such as browser `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-memory store with an optional size limit, counted in bytes of stored values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let others: usize = self
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// A revealed card as kept in history, stamped with when it was saved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub card: Card,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, newest-first list of revealed cards backed by a [`KeyValueStore`].
#[derive(Debug)]
pub struct History<S> {
    store: S,
    entries: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> History<S> {
    pub const KEY: &'static str = "powercard:history:v1";
    pub const LIMIT: usize = 10;

    /// Reads the persisted list, absent or malformed data counts as empty.
    pub fn load(store: S) -> Self {
        let entries = match store.get(Self::KEY) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(mut entries) => {
                    entries.truncate(Self::LIMIT);
                    entries
                }
                Err(err) => {
                    log::warn!("ignoring unreadable card history: {}", err);
                    Vec::new()
                }
            },
        };
        log::debug!("loaded {} history entries", entries.len());
        Self { store, entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Prepends a stamped copy of `card`, drops whatever falls past the limit and persists the result.
    ///
    /// A failed write leaves the in-memory list updated and is reported as a warning.
    pub fn append(&mut self, card: &Card, now: DateTime<Utc>) -> Result<(), PersistenceWarning> {
        self.entries.insert(
            0,
            HistoryEntry {
                card: card.clone(),
                timestamp: now,
            },
        );
        self.entries.truncate(Self::LIMIT);

        let raw = serde_json::to_string(&self.entries).map_err(|err| PersistenceWarning(err.to_string()))?;
        self.store.set(Self::KEY, &raw).map_err(|err| {
            log::warn!("could not save card history: {}", err);
            PersistenceWarning(err.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::tests::{sample_card, t0};
    use chrono::TimeDelta;

    #[test]
    fn load_from_empty_store() {
        let history = History::load(MemoryStore::new());

        assert!(history.is_empty());
    }

    #[test]
    fn load_treats_corrupt_data_as_empty() {
        let mut store = MemoryStore::new();
        store.set(History::<MemoryStore>::KEY, "{not json").unwrap();

        let history = History::load(store);

        assert!(history.is_empty());
    }

    #[test]
    fn append_keeps_ten_newest_first() {
        let mut history = History::load(MemoryStore::new());

        for i in 0..11 {
            let card = sample_card(&format!("site{i}.com"));
            history.append(&card, t0() + TimeDelta::seconds(i)).unwrap();
        }

        assert_eq!(history.len(), 10);
        assert_eq!(history.entries()[0].card.site_name(), "site10.com");
        assert_eq!(history.entries()[9].card.site_name(), "site1.com");
        assert!(
            history
                .entries()
                .windows(2)
                .all(|pair| pair[0].timestamp > pair[1].timestamp)
        );
    }

    #[test]
    fn append_persists_and_reloads() {
        let mut history = History::load(MemoryStore::new());
        history.append(&sample_card("example.com"), t0()).unwrap();
        history.append(&sample_card("other.com"), t0()).unwrap();

        let reloaded = History::load(history.into_store());

        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.entries()[0].card.site_name(), "other.com");
        assert_eq!(reloaded.entries()[1].card, sample_card("example.com"));
    }

    #[test]
    fn failed_write_still_updates_memory() {
        let mut history = History::load(MemoryStore::with_quota(16));

        let result = history.append(&sample_card("example.com"), t0());

        assert!(result.is_err());
        assert_eq!(history.len(), 1);
        assert_eq!(history.store().writes(), 0);
    }

    #[test]
    fn stored_entries_flatten_card_fields() {
        let mut history = History::load(MemoryStore::new());
        history.append(&sample_card("example.com"), t0()).unwrap();

        let raw = history.store().get(History::<MemoryStore>::KEY).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(json[0]["siteName"], "example.com");
        assert_eq!(json[0]["hiddenAdvantage"], "Improves Wi-Fi strength by exactly 0.0001%");
        assert!(json[0]["timestamp"].is_string());
    }
}
