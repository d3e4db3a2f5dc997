//! Best-effort cache seam.
//!
//! Caches here are advisory speed optimizations, never a source of truth:
//! absence, expiry, or serialization failure must degrade to direct store
//! computation without failing the request.
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Get/set/forget by string key with TTL.
pub trait Cache {
    /// Fetch a live entry, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Store an entry for `ttl_seconds`.
    fn put(&self, key: &str, value: String, ttl_seconds: u64);

    /// Drop an entry, if present.
    fn forget(&self, key: &str);
}

/// Fetch and decode a cached JSON payload. Undecodable entries are treated
/// as misses.
pub fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    let raw = cache.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::debug!("cache entry {key} failed to decode: {err}");
            None
        }
    }
}

/// Encode and store a JSON payload. Encoding failures only skip the cache.
pub fn put_json<T: Serialize>(cache: &dyn Cache, key: &str, value: &T, ttl_seconds: u64) {
    match serde_json::to_string(value) {
        Ok(raw) => cache.put(key, raw, ttl_seconds),
        Err(err) => log::debug!("cache entry {key} failed to encode: {err}"),
    }
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn put(&self, _key: &str, _value: String, _ttl_seconds: u64) {}

    fn forget(&self, _key: &str) {}
}

/// In-process cache with per-entry expiry (useful for tests and single-node
/// deployments).
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .borrow()
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.borrow();
        let (value, expires) = entries.get(key)?;
        if *expires <= Instant::now() {
            return None;
        }
        Some(value.clone())
    }

    fn put(&self, key: &str, value: String, ttl_seconds: u64) {
        let expires = Instant::now() + Duration::from_secs(ttl_seconds);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), (value, expires));
    }

    fn forget(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}
