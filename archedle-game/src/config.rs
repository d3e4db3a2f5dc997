//! Engine configuration.
use serde::{Deserialize, Serialize};

/// Cache TTL knobs, in seconds. A value of 0 disables the cache concerned and
/// every read falls through to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
    /// TTL for per-identity guess history payloads.
    pub history_cache_ttl_seconds: u64,
    /// TTL for the daily hard-mode clue set. When 0 the clue cache instead
    /// expires at the end of the current day (minimum 60s).
    pub clue_cache_ttl_seconds: u64,
    /// TTL for statistics snapshots.
    pub statistics_cache_ttl_seconds: u64,
}

impl GameConfig {
    /// Whether history payloads should be cached at all.
    #[must_use]
    pub const fn history_cache_enabled(&self) -> bool {
        self.history_cache_ttl_seconds > 0
    }

    /// Whether statistics snapshots should be cached at all.
    #[must_use]
    pub const fn statistics_cache_enabled(&self) -> bool {
        self.statistics_cache_ttl_seconds > 0
    }
}
