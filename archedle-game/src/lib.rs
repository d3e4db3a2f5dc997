//! Archedle Game Engine
//!
//! Platform-agnostic core logic for the Archedle daily guessing game.
//! Each calendar day a target student is selected deterministically per game
//! mode, players resolve free-text guesses against the catalog, and every
//! guess is scored, recorded per identity, and folded into statistics.
//! Persistence, caching, and time all enter through traits so the crate can
//! run against any backing store.

use chrono::{DateTime, Local, NaiveDate, Utc};

pub mod cache;
pub mod catalog;
pub mod clues;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod matcher;
pub mod modes;
pub mod round;
pub mod select;
pub mod session;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use cache::{Cache, MemoryCache, NoCache};
pub use catalog::{CatalogStore, SearchCandidate, Student, StudentId, StudentSummary};
pub use clues::{
    Clue, CluePublic, ClueStore, ClueTier, ClueUsage, ClueUsageStore, HintBand, HINT_BANDS,
    daily_clues, log_clue_usage, threshold_for_order,
};
pub use config::GameConfig;
pub use engine::{GameEngine, GuessOutcome};
pub use error::{GameError, StoreError};
pub use identity::Identity;
pub use ledger::{AttemptLedger, GuessRow, GuessStore, HistoryEntry};
pub use matcher::{FieldMatches, HeightStatus, MatchResult, find_guessed_student, score_guess};
pub use modes::GameMode;
pub use round::{Round, RoundId, RoundStore};
pub use select::select_daily_student_id;
pub use session::DailySessionMemory;
pub use stats::{RunRow, RunStore, Snapshot, StatisticsAggregator};
pub use store::{GameStore, MemoryStore};

/// Trait for abstracting the current date and time
/// Platform-specific implementations should provide this
pub trait Clock {
    /// Current calendar day at day granularity (server-local).
    fn today(&self) -> NaiveDate;

    /// Current instant, used for timestamps and cache expiry math.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed date and instant (useful for tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl FixedClock {
    /// Pin the clock to midnight UTC of the given date.
    #[must_use]
    pub fn at(date: NaiveDate) -> Self {
        let now = date
            .and_hms_opt(0, 0, 0)
            .map_or_else(Utc::now, |dt| dt.and_utc());
        Self { today: date, now }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
