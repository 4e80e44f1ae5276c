//! Key/value store abstraction backing persisted flags.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Durable boolean key/value storage.
///
/// Absence of a key means "unset", which callers treat as `false`.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<bool>>;
    fn put(&mut self, key: &str, value: bool) -> Result<()>;
}

/// In-memory store. Clones share the same map, so a test can keep a handle
/// and inspect what the coordinator wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, bool>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing values.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.entries.lock();
            for (key, value) in entries {
                map.insert(key.to_string(), value);
            }
        }
        store
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<bool> {
        self.entries.lock().get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.value(key))
    }

    fn put(&mut self, key: &str, value: bool) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }
}
