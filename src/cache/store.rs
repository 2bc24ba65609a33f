//! Cache Store Module
//!
//! In-process cache engine combining HashMap storage with LRU tracking and
//! TTL expiration. Strings and hashes follow Redis semantics closely enough
//! that handlers cannot tell the backends apart.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheCommand, CacheEntry, CacheError, CacheResult, CacheValue, LruTracker};

// == Cache Store ==
/// Main cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Live Entry ==
    /// Returns the entry under `key`, dropping it first if it has expired.
    fn live_entry(&mut self, key: &str) -> Option<&mut CacheEntry> {
        if self.entries.get(key).is_some_and(CacheEntry::is_expired) {
            self.entries.remove(key);
            self.lru.remove(key);
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        self.lru.touch(key);
        Some(entry)
    }

    // == Insert ==
    /// Stores an entry, evicting the least recently used key when full.
    fn insert(&mut self, key: String, entry: CacheEntry) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
            }
        }
        self.lru.touch(&key);
        self.entries.insert(key, entry);
    }

    // == Set ==
    /// Stores a string under `key`, replacing any previous value and TTL.
    pub fn set(&mut self, key: String, value: String, ttl: Duration) {
        self.insert(key, CacheEntry::new(CacheValue::Text(value), Some(ttl)));
    }

    // == Hash Set ==
    /// Merges `fields` into the hash under `key` and resets its TTL.
    ///
    /// Fails with `WrongType` if the key currently holds a string.
    pub fn hash_set(
        &mut self,
        key: String,
        fields: Vec<(String, String)>,
        ttl: Duration,
    ) -> CacheResult<()> {
        if let Some(entry) = self.live_entry(&key) {
            let CacheValue::Hash(existing) = &mut entry.value else {
                return Err(CacheError::WrongType(key));
            };
            existing.extend(fields);
            entry.expire_in(ttl);
            return Ok(());
        }
        let hash = fields.into_iter().collect();
        self.insert(key, CacheEntry::new(CacheValue::Hash(hash), Some(ttl)));
        Ok(())
    }

    // == Get ==
    /// Retrieves a string by key. Missing and expired keys yield `None`.
    pub fn get(&mut self, key: &str) -> CacheResult<Option<String>> {
        match self.live_entry(key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(CacheValue::Text(value)) => Ok(Some(value.clone())),
            Some(CacheValue::Hash(_)) => Err(CacheError::WrongType(key.to_string())),
        }
    }

    // == Hash Get All ==
    /// Retrieves every field of a hash. Missing and expired keys yield `None`.
    pub fn hash_get_all(&mut self, key: &str) -> CacheResult<Option<HashMap<String, String>>> {
        match self.live_entry(key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(CacheValue::Hash(fields)) => Ok(Some(fields.clone())),
            Some(CacheValue::Text(_)) => Err(CacheError::WrongType(key.to_string())),
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether a key was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    // == Apply ==
    /// Applies a batch of commands in order.
    ///
    /// Like a Redis transaction, a failing command does not stop the rest of
    /// the batch; the first failure is reported once all have run.
    pub fn apply(&mut self, commands: &[CacheCommand]) -> CacheResult<()> {
        let mut first_error = None;
        for command in commands {
            let outcome = match command {
                CacheCommand::HashSet { key, fields, ttl } => {
                    self.hash_set(key.clone(), fields.clone(), *ttl)
                }
                CacheCommand::Set { key, value, ttl } => {
                    self.set(key.clone(), value.clone(), *ttl);
                    Ok(())
                }
                CacheCommand::Delete { key } => {
                    self.delete(key);
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // == Time To Live ==
    /// Remaining lifetime of a live key.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(CacheEntry::ttl_remaining)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
