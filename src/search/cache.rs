//! Query result cache.
//!
//! Values are opaque serialized pages. Implementations are shared between
//! requests and synchronize internally.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

pub trait QueryCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
    /// Drops every entry, used after writes that change visible listings.
    fn clear(&self);
}

/// Cache that never stores anything.
pub struct NoOpQueryCache;

impl QueryCache for NoOpQueryCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: String, _ttl: Duration) {}

    fn clear(&self) {}
}

struct CacheEntry {
    value: String,
    inserted_at: Instant,
    expires_at: Instant,
}

/// Process-local TTL cache bounded by entry count. When full, expired entries
/// are dropped first, then the oldest insertion.
pub struct InMemoryQueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl InMemoryQueryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn make_room(entries: &mut HashMap<String, CacheEntry>, max_entries: usize, now: Instant) {
        if entries.len() < max_entries {
            return;
        }
        entries.retain(|_, entry| entry.expires_at > now);
        while entries.len() >= max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!("Evicting cache entry {}", key);
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl QueryCache for InMemoryQueryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(_) => {
                warn!("Query cache mutex poisoned, bypassing cache");
                return None;
            }
        };
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        if self.max_entries == 0 || ttl.is_zero() {
            return;
        }
        let Ok(mut entries) = self.entries.lock() else {
            warn!("Query cache mutex poisoned, dropping write for {}", key);
            return;
        };
        let now = Instant::now();
        if !entries.contains_key(key) {
            Self::make_room(&mut entries, self.max_entries, now);
        }
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: now,
                expires_at: now + ttl,
            },
        );
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
