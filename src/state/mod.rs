//! Persisted consent and trigger flags.
//!
//! Flags live in an in-memory cache in front of a [`KeyValueStore`]. Reads are
//! served from the cache and writes update it immediately; the store itself
//! is written on a background [`StoreWriter`] so no event waits on disk. A
//! failed backing write is logged on the writer and otherwise ignored: the
//! cached value keeps driving decisions and the store catches up on the next
//! successful write.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

pub mod sqlite;
pub mod store;
pub mod writer;

pub use sqlite::SqliteStore;
pub use store::{KeyValueStore, MemoryStore};
pub use writer::{PendingWrite, StoreWriter, WriterStats};

/// Keys held in the persisted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateKey {
    TermsAccepted,
    AutoTriggerEnabled,
    WelcomeMessageShown,
}

impl StateKey {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TermsAccepted => "terms-accepted",
            Self::AutoTriggerEnabled => "auto-trigger-enabled",
            Self::WelcomeMessageShown => "welcome-message-shown",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [StateKey] {
        &[
            Self::TermsAccepted,
            Self::AutoTriggerEnabled,
            Self::WelcomeMessageShown,
        ]
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement of a flag write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAck {
    Persisted,
    /// The in-memory value was updated but the backing store rejected it.
    CacheOnly,
}

/// Point-in-time copy of every persisted flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub terms_accepted: bool,
    pub auto_trigger_enabled: bool,
    pub welcome_message_shown: bool,
}

pub struct PersistedState {
    cache: HashMap<StateKey, bool>,
    writer: StoreWriter,
}

impl PersistedState {
    /// Load every known key from the store, then hand the store to a
    /// background writer. Unreadable keys count as unset.
    pub fn load(store: Box<dyn KeyValueStore>) -> Result<Self> {
        let mut cache = HashMap::new();
        for key in StateKey::all() {
            match store.get(key.as_str()) {
                Ok(Some(value)) => {
                    cache.insert(*key, value);
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(target: "recgate::state", key = %key, error = %err, "persisted read failed; treating as unset");
                }
            }
        }
        Ok(Self {
            cache,
            writer: StoreWriter::spawn(store)?,
        })
    }

    #[must_use]
    pub fn get(&self, key: StateKey) -> bool {
        self.cache.get(&key).copied().unwrap_or(false)
    }

    /// Update a flag. The cached value changes at once and is never rolled
    /// back; the store write is queued.
    pub fn set(&mut self, key: StateKey, value: bool) -> PendingWrite {
        self.cache.insert(key, value);
        self.writer.submit(key, value)
    }

    /// Block until every queued write has reached the store.
    pub fn drain(&self) -> WriterStats {
        self.writer.drain()
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            terms_accepted: self.get(StateKey::TermsAccepted),
            auto_trigger_enabled: self.get(StateKey::AutoTriggerEnabled),
            welcome_message_shown: self.get(StateKey::WelcomeMessageShown),
        }
    }
}

impl std::fmt::Debug for PersistedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedState")
            .field("cache", &self.cache)
            .field("writer", &self.writer)
            .finish()
    }
}
