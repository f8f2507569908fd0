//! Per-key expiring map.
//!
//! Not synchronised; owners wrap it in their own lock.

use chrono::{DateTime, Duration, Utc};
use domain_pricing::Clock;
use std::collections::HashMap;
use std::sync::Arc;

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

pub struct TtlCache<V> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: HashMap<String, Entry<V>>,
}

impl<V> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The value for `key` if it has not expired
    pub fn get(&self, key: &str) -> Option<&V> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| &entry.value)
    }

    /// Store `value`, replacing any previous entry, with a fresh expiry
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> &V {
        let expires_at = self.clock.now() + self.ttl;
        let entry = self.entries.entry(key.into()).insert_entry(Entry { value, expires_at });
        &entry.into_mut().value
    }

    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.expires_at)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Entries not yet expired
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
