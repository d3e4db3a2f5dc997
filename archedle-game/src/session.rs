//! Per-session daily memory.
//!
//! Tracks which one-shot interactions (completion recaps, intro modals) a
//! session has already seen today. The memory is day-scoped: rolling into a
//! new calendar day clears every flag, so each day's recap shows once.
use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day-scoped set of seen-flags for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySessionMemory {
    date: NaiveDate,
    seen: HashSet<String>,
}

impl DailySessionMemory {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            seen: HashSet::new(),
        }
    }

    /// The day this memory is scoped to.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Advance to `today`, clearing all flags when the day changed. Returns
    /// true when a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.date == today {
            return false;
        }
        self.date = today;
        self.seen.clear();
        true
    }

    /// Mark a flag as seen. Returns true the first time, false on repeats.
    pub fn mark(&mut self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }

    /// Whether a flag was marked today.
    #[must_use]
    pub fn is_marked(&self, key: &str) -> bool {
        self.seen.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("valid date")
    }

    #[test]
    fn marks_show_once_per_day() {
        let mut memory = DailySessionMemory::new(date("2025-01-01"));
        assert!(memory.mark("classic_recap"));
        assert!(!memory.mark("classic_recap"));
        assert!(memory.is_marked("classic_recap"));
        assert!(!memory.is_marked("hard_recap"));
    }

    #[test]
    fn rolling_into_a_new_day_clears_flags() {
        let mut memory = DailySessionMemory::new(date("2025-01-01"));
        memory.mark("classic_recap");

        assert!(!memory.roll_over(date("2025-01-01")));
        assert!(memory.is_marked("classic_recap"));

        assert!(memory.roll_over(date("2025-01-02")));
        assert!(!memory.is_marked("classic_recap"));
        assert_eq!(memory.date(), date("2025-01-02"));
    }
}
