//! Closed set of game modes.
//!
//! Mode dispatch is an enumerated table: unknown keys are rejected up front
//! with [`GameError::UnknownMode`] before any state is touched.
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// A daily game mode. Each mode owns one round (and one target) per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Classic,
    Hard,
    Image,
}

impl GameMode {
    /// All supported modes in stable display order.
    pub const ALL: [Self; 3] = [Self::Classic, Self::Hard, Self::Image];

    /// Lowercase key used in seeds, cache keys, and wire payloads.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Hard => "hard",
            Self::Image => "image",
        }
    }

    /// Human-readable mode name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Hard => "Hard",
            Self::Image => "Image",
        }
    }

    /// Parse a mode key, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownMode`] for keys outside the supported set.
    pub fn from_key(key: &str) -> Result<Self, GameError> {
        match key.trim().to_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "hard" => Ok(Self::Hard),
            "image" => Ok(Self::Image),
            other => Err(GameError::UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips_through_from_key() {
        for mode in GameMode::ALL {
            assert_eq!(GameMode::from_key(mode.key()), Ok(mode));
        }
    }

    #[test]
    fn from_key_is_case_insensitive() {
        assert_eq!(GameMode::from_key(" Hard "), Ok(GameMode::Hard));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert_eq!(
            GameMode::from_key("speedrun"),
            Err(GameError::UnknownMode("speedrun".to_string()))
        );
    }
}
