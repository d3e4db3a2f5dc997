//! Daily rounds: one target per (calendar day, mode).
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::StudentId;
use crate::error::StoreError;
use crate::modes::GameMode;

/// Identifier of a daily round.
pub type RoundId = u64;

/// The day+mode pairing that fixes a single target student for all players
/// that day. Unique on `(played_on, mode)`; never updated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub played_on: NaiveDate,
    pub mode: GameMode,
    pub student_id: StudentId,
}

/// Persistence for daily rounds.
///
/// `insert_round` must enforce the `(played_on, mode)` uniqueness constraint:
/// a losing concurrent insert gets [`StoreError::Conflict`] and falls back to
/// reading the winner's row.
pub trait RoundStore {
    /// Round for a given day and mode, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the lookup.
    fn find_round(&self, date: NaiveDate, mode: GameMode) -> Result<Option<Round>, StoreError>;

    /// Insert a new round.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a round already exists for
    /// `(date, mode)`.
    fn insert_round(
        &self,
        date: NaiveDate,
        mode: GameMode,
        student_id: StudentId,
    ) -> Result<Round, StoreError>;

    /// Round lookup by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the lookup.
    fn round_by_id(&self, id: RoundId) -> Result<Option<Round>, StoreError>;

    /// Every recorded round, any order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the scan.
    fn all_rounds(&self) -> Result<Vec<Round>, StoreError>;
}
