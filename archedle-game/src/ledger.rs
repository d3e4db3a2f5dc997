//! Attempt ledger: append-only guess log per identity and round.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Clock;
use crate::cache::{self, Cache};
use crate::catalog::{CatalogStore, Student, StudentId};
use crate::error::{GameError, StoreError};
use crate::identity::Identity;
use crate::matcher::{FieldMatches, HeightStatus, MatchResult};
use crate::round::{Round, RoundId};

/// Identifier of a ledger row.
pub type GuessId = u64;

/// One recorded guess. At most one row exists per
/// `(identity, round, student)`; resubmitting the same student returns the
/// prior row. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessRow {
    pub id: GuessId,
    pub identity: Identity,
    pub round_id: RoundId,
    pub student_id: StudentId,
    /// 1-based, gapless within `(identity, round)`.
    pub attempt_number: u32,
    pub is_correct: bool,
    pub guess_text: String,
    pub matches: FieldMatches,
    pub height_status: HeightStatus,
    pub created_at: DateTime<Utc>,
}

/// Row data for a guess insert; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGuess {
    pub identity: Identity,
    pub round_id: RoundId,
    pub student_id: StudentId,
    pub attempt_number: u32,
    pub is_correct: bool,
    pub guess_text: String,
    pub matches: FieldMatches,
    pub height_status: HeightStatus,
    pub created_at: DateTime<Utc>,
}

/// Persistence for guess rows, both identity kinds.
///
/// `insert_guess` must enforce `(identity, round, student)` uniqueness and
/// answer a duplicate with [`StoreError::Conflict`] so a racing submit can
/// resolve to the existing row.
pub trait GuessStore {
    /// Existing row for `(identity, round, student)`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the lookup.
    fn find_guess(
        &self,
        identity: &Identity,
        round_id: RoundId,
        student_id: StudentId,
    ) -> Result<Option<GuessRow>, StoreError>;

    /// Insert a new row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a row already exists for the
    /// `(identity, round, student)` key.
    fn insert_guess(&self, guess: NewGuess) -> Result<GuessRow, StoreError>;

    /// All rows for `(identity, round)` ordered by attempt number ascending.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the scan.
    fn guesses_for(&self, identity: &Identity, round_id: RoundId)
    -> Result<Vec<GuessRow>, StoreError>;

    /// Most recently created row for an identity across all rounds.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the lookup.
    fn latest_guess(&self, identity: &Identity) -> Result<Option<GuessRow>, StoreError>;

    /// Every guess row, any order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the scan.
    fn all_guesses(&self) -> Result<Vec<GuessRow>, StoreError>;

    /// Delete every guess tied to a round (admin reset).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the delete.
    fn delete_guesses_for_round(&self, round_id: RoundId) -> Result<(), StoreError>;
}

/// Student display columns joined into history payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStudent {
    pub id: StudentId,
    pub first_name: String,
    pub second_name: String,
    pub image: String,
    pub age: u8,
    pub birthday: String,
    pub height: String,
    pub school: String,
    pub club: String,
    pub role: String,
    pub position: String,
    pub class: String,
    pub damage_type: String,
    pub armor_type: String,
    pub weapon_type: String,
    pub equipment_1: String,
    pub equipment_2: String,
    pub equipment_3: String,
    pub unique_equipment_name: String,
    pub unique_equipment_img: String,
    pub memorial_lobby: Option<String>,
}

impl From<&Student> for HistoryStudent {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            first_name: student.first_name.clone(),
            second_name: student.second_name.clone(),
            image: student.image.clone(),
            age: student.age,
            birthday: student.birthday.clone(),
            height: student.height.clone(),
            school: student.school.clone(),
            club: student.club.clone(),
            role: student.role.clone(),
            position: student.position.clone(),
            class: student.class.clone(),
            damage_type: student.damage_type.clone(),
            armor_type: student.armor_type.clone(),
            weapon_type: student.weapon_type.clone(),
            equipment_1: student.equipment_1.clone(),
            equipment_2: student.equipment_2.clone(),
            equipment_3: student.equipment_3.clone(),
            unique_equipment_name: student.unique_equipment_name.clone(),
            unique_equipment_img: student.unique_equipment_img.clone(),
            memorial_lobby: student.memorial_lobby.clone(),
        }
    }
}

/// One enriched history record: the guessed student's display columns
/// flattened beside the per-guess result fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub student: Option<HistoryStudent>,
    pub correct: bool,
    pub matches: FieldMatches,
    #[serde(rename = "heightStatus")]
    pub height_status: HeightStatus,
}

/// Bookkeeping over one identity's guesses within rounds.
///
/// The same ledger type serves registered users and guests; the identity
/// passed per call decides which guess partition is touched.
pub struct AttemptLedger<'a> {
    store: &'a dyn GuessStore,
    cache: &'a dyn Cache,
    clock: &'a dyn Clock,
    history_ttl_seconds: u64,
}

impl<'a> AttemptLedger<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn GuessStore,
        cache: &'a dyn Cache,
        clock: &'a dyn Clock,
        history_ttl_seconds: u64,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            history_ttl_seconds,
        }
    }

    /// Whether this identity has already found the round's target.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn has_completed(&self, identity: &Identity, round: &Round) -> Result<bool, GameError> {
        Ok(self
            .store
            .guesses_for(identity, round.id)?
            .iter()
            .any(|guess| guess.is_correct))
    }

    /// Number of recorded guesses for `(identity, round)`.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn attempt_count(&self, identity: &Identity, round: &Round) -> Result<u32, GameError> {
        let count = self.store.guesses_for(identity, round.id)?.len();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Distinct student ids already guessed, for search exclusion.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn guessed_student_ids(
        &self,
        identity: &Identity,
        round: &Round,
    ) -> Result<Vec<StudentId>, GameError> {
        Ok(self
            .store
            .guesses_for(identity, round.id)?
            .iter()
            .map(|guess| guess.student_id)
            .collect())
    }

    /// Correctness of the highest-attempt-number guess, if any.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn last_result(&self, identity: &Identity, round: &Round) -> Result<Option<bool>, GameError> {
        Ok(self
            .store
            .guesses_for(identity, round.id)?
            .last()
            .map(|guess| guess.is_correct))
    }

    /// Record a guess, idempotently.
    ///
    /// An existing row for `(identity, round, student)` is returned unchanged
    /// (double-click or retry protection). A new row gets attempt number
    /// `count + 1`; the cached history payload for this identity+round is
    /// invalidated. A concurrent duplicate insert resolves to the winner's
    /// row.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn record_guess(
        &self,
        identity: &Identity,
        round: &Round,
        student_id: StudentId,
        result: &MatchResult,
        guess_text: &str,
    ) -> Result<GuessRow, GameError> {
        if let Some(existing) = self.store.find_guess(identity, round.id, student_id)? {
            return Ok(existing);
        }

        let attempt_number = self.attempt_count(identity, round)? + 1;
        let inserted = self.store.insert_guess(NewGuess {
            identity: identity.clone(),
            round_id: round.id,
            student_id,
            attempt_number,
            is_correct: result.is_match,
            guess_text: guess_text.to_string(),
            matches: result.fields,
            height_status: result.height_status,
            created_at: self.clock.now(),
        });

        let row = match inserted {
            Ok(row) => row,
            Err(StoreError::Conflict(_)) => self
                .store
                .find_guess(identity, round.id, student_id)?
                .ok_or(StoreError::Unavailable(
                    "duplicate guess vanished between insert and re-read".to_string(),
                ))?,
            Err(err) => return Err(err.into()),
        };

        if self.history_ttl_seconds > 0 {
            self.cache.forget(&self.history_cache_key(identity, round.id));
        }
        Ok(row)
    }

    /// Attempt-ordered history enriched with student display columns.
    /// Cached per `(identity, round)` when the history TTL is non-zero.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn history(
        &self,
        catalog: &dyn CatalogStore,
        identity: &Identity,
        round: &Round,
    ) -> Result<Vec<HistoryEntry>, GameError> {
        if self.history_ttl_seconds == 0 {
            return self.build_history(catalog, identity, round);
        }

        let key = self.history_cache_key(identity, round.id);
        if let Some(cached) = cache::get_json::<Vec<HistoryEntry>>(self.cache, &key) {
            return Ok(cached);
        }

        let entries = self.build_history(catalog, identity, round)?;
        cache::put_json(self.cache, &key, &entries, self.history_ttl_seconds);
        Ok(entries)
    }

    /// Most recent guess for the identity across all rounds, enriched.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn latest_guess(
        &self,
        catalog: &dyn CatalogStore,
        identity: &Identity,
    ) -> Result<Option<HistoryEntry>, GameError> {
        Ok(self
            .store
            .latest_guess(identity)?
            .map(|row| enrich(catalog, &row)))
    }

    /// Most recent guess for the identity within one round, enriched.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn latest_guess_for_round(
        &self,
        catalog: &dyn CatalogStore,
        identity: &Identity,
        round: &Round,
    ) -> Result<Option<HistoryEntry>, GameError> {
        Ok(self
            .store
            .guesses_for(identity, round.id)?
            .last()
            .map(|row| enrich(catalog, row)))
    }

    fn build_history(
        &self,
        catalog: &dyn CatalogStore,
        identity: &Identity,
        round: &Round,
    ) -> Result<Vec<HistoryEntry>, GameError> {
        Ok(self
            .store
            .guesses_for(identity, round.id)?
            .iter()
            .map(|row| enrich(catalog, row))
            .collect())
    }

    fn history_cache_key(&self, identity: &Identity, round_id: RoundId) -> String {
        match identity {
            Identity::User(id) => format!("user_history:{id}:{round_id}"),
            Identity::Guest(token) => format!("guest_history:{token}:{round_id}"),
        }
    }
}

fn enrich(catalog: &dyn CatalogStore, row: &GuessRow) -> HistoryEntry {
    HistoryEntry {
        student: catalog
            .student_by_id(row.student_id)
            .map(|student| HistoryStudent::from(&student)),
        correct: row.is_correct,
        matches: row.matches,
        height_status: row.height_status,
    }
}
