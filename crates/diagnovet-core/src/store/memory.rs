//! In-memory store, the substitute for local storage in tests.

use std::collections::BTreeMap;

use super::{KeyValueStore, StoreResult};

/// Map-backed [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with raw entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("lang", "es").unwrap();
        assert_eq!(store.get("lang").unwrap(), Some("es".into()));

        store.set("lang", "en").unwrap();
        assert_eq!(store.get("lang").unwrap(), Some("en".into()));
        assert_eq!(store.len(), 1);

        assert!(store.remove("lang").unwrap());
        assert!(!store.remove("lang").unwrap());
        assert_eq!(store.get("lang").unwrap(), None);
    }

    #[test]
    fn test_with_entries() {
        let store = MemoryStore::with_entries([("reports", "[]"), ("appLanguage", "es")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("appLanguage").unwrap(), Some("es".into()));
    }
}
