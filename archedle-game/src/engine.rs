//! The game engine: one facade tying selection, matching, the ledger, clues,
//! and statistics together over a backing store.
use std::cell::RefCell;
use std::collections::HashMap;

use crate::Clock;
use crate::cache::Cache;
use crate::catalog::{SearchCandidate, Student};
use crate::clues::{self, CluePublic};
use crate::config::GameConfig;
use crate::error::{GameError, StoreError};
use crate::identity::Identity;
use crate::ledger::{AttemptLedger, HistoryEntry};
use crate::matcher::{self, MatchResult};
use crate::modes::GameMode;
use crate::round::Round;
use crate::select::select_daily_student_id;
use crate::stats::{Snapshot, StatisticsAggregator};
use crate::store::GameStore;

/// Result of one guess submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The identity already found this round's target; nothing was recorded.
    AlreadyCompleted,
    /// The guess text resolved to no catalog student; nothing was recorded.
    InvalidGuess,
    /// The guess was scored and recorded.
    Recorded {
        correct: bool,
        /// Attempt count for this identity and round after recording.
        attempts: u32,
        result: MatchResult,
    },
}

/// Orchestrates one player-facing request against the stores.
///
/// Rounds resolved during the engine's lifetime are memoized per mode, so
/// repeated operations within a request hit the round registry once. Build a
/// fresh engine per request; the memo must not outlive the day.
pub struct GameEngine<'a, S: GameStore> {
    store: &'a S,
    cache: &'a dyn Cache,
    clock: &'a dyn Clock,
    config: GameConfig,
    rounds: RefCell<HashMap<GameMode, Round>>,
}

impl<'a, S: GameStore> GameEngine<'a, S> {
    #[must_use]
    pub fn new(
        store: &'a S,
        cache: &'a dyn Cache,
        clock: &'a dyn Clock,
        config: GameConfig,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            config,
            rounds: RefCell::new(HashMap::new()),
        }
    }

    /// Today's round for a mode, creating it on first access.
    ///
    /// Creation selects the target deterministically and inserts the round; a
    /// losing concurrent insert re-reads the winner's row.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EmptyCatalog`] when no target can be selected, or
    /// a [`StoreError`] from the backend.
    pub fn round_for(&self, mode: GameMode) -> Result<Round, GameError> {
        if let Some(round) = self.rounds.borrow().get(&mode) {
            return Ok(*round);
        }

        let today = self.clock.today();
        let round = match self.store.find_round(today, mode)? {
            Some(round) => round,
            None => {
                let student_id = select_daily_student_id(today, mode, self.store)?;
                match self.store.insert_round(today, mode, student_id) {
                    Ok(round) => round,
                    Err(StoreError::Conflict(_)) => self
                        .store
                        .find_round(today, mode)?
                        .ok_or(StoreError::Unavailable(
                            "round vanished between insert and re-read".to_string(),
                        ))?,
                    Err(err) => return Err(err.into()),
                }
            }
        };

        self.rounds.borrow_mut().insert(mode, round);
        Ok(round)
    }

    /// Today's target student for a mode.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MissingTarget`] when the round references a
    /// student no longer in the catalog.
    pub fn daily_student(&self, mode: GameMode) -> Result<Student, GameError> {
        let round = self.round_for(mode)?;
        self.store
            .student_by_id(round.student_id)
            .ok_or(GameError::MissingTarget(round.id))
    }

    /// Submit a free-text guess for an identity in a mode.
    ///
    /// Completion is checked before anything else; a completed round accepts
    /// no further guesses. The guess is then resolved against the catalog,
    /// scored against the target, and recorded idempotently. Hard-mode clue
    /// exposure is logged with the post-record attempt count, and a correct
    /// guess upserts the identity's run fact.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backends and
    /// [`GameError::MissingTarget`] for a round with no catalog target.
    pub fn submit_guess(
        &self,
        identity: &Identity,
        mode: GameMode,
        guess_text: &str,
    ) -> Result<GuessOutcome, GameError> {
        let round = self.round_for(mode)?;
        let ledger = self.ledger();

        if ledger.has_completed(identity, &round)? {
            return Ok(GuessOutcome::AlreadyCompleted);
        }

        let Some(guessed) = matcher::find_guessed_student(self.store, guess_text) else {
            return Ok(GuessOutcome::InvalidGuess);
        };
        let target = self
            .store
            .student_by_id(round.student_id)
            .ok_or(GameError::MissingTarget(round.id))?;

        let result = matcher::score_guess(&guessed, &target);
        ledger.record_guess(identity, &round, guessed.id, &result, guess_text)?;
        let attempts = ledger.attempt_count(identity, &round)?;

        clues::log_clue_usage(self.store, self.store, &round, attempts, identity)?;

        if result.is_match {
            self.store.upsert_run(identity, round.id, mode, attempts)?;
        }

        Ok(GuessOutcome::Recorded {
            correct: result.is_match,
            attempts,
            result,
        })
    }

    /// Whether an identity has completed today's round in a mode.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn has_completed(&self, identity: &Identity, mode: GameMode) -> Result<bool, GameError> {
        let round = self.round_for(mode)?;
        self.ledger().has_completed(identity, &round)
    }

    /// Attempt count for an identity in today's round of a mode.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn attempt_count(&self, identity: &Identity, mode: GameMode) -> Result<u32, GameError> {
        let round = self.round_for(mode)?;
        self.ledger().attempt_count(identity, &round)
    }

    /// Name-prefix search over the catalog, excluding students the identity
    /// already guessed this round. At most ten results, catalog order,
    /// projected to id and names only.
    ///
    /// A two-token term matches first/second name prefixes in either order; a
    /// single token matches a prefix of either name. Empty terms return
    /// nothing.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn search_candidates(
        &self,
        identity: &Identity,
        mode: GameMode,
        term: &str,
    ) -> Result<Vec<SearchCandidate>, GameError> {
        let clean = term.trim().to_lowercase();
        if clean.is_empty() {
            return Ok(Vec::new());
        }
        let mut tokens = clean.split_whitespace();
        let head = tokens.next().unwrap_or_default();
        let tail = tokens.next().unwrap_or_default();

        let round = self.round_for(mode)?;
        let guessed = self.ledger().guessed_student_ids(identity, &round)?;

        let results = self
            .store
            .all_students()
            .into_iter()
            .filter(|student| !guessed.contains(&student.id))
            .filter(|student| {
                let first = student.first_name.to_lowercase();
                let second = student.second_name.to_lowercase();
                if tail.is_empty() {
                    first.starts_with(head) || second.starts_with(head)
                } else {
                    (first.starts_with(head) && second.starts_with(tail))
                        || (first.starts_with(tail) && second.starts_with(head))
                }
            })
            .take(10)
            .map(SearchCandidate::from)
            .collect();
        Ok(results)
    }

    /// Today's hard-mode clue set, public projection.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn hard_mode_clues(&self, force_regenerate: bool) -> Result<Vec<CluePublic>, GameError> {
        let round = self.round_for(GameMode::Hard)?;
        let clues = clues::daily_clues(
            self.store,
            self.store,
            self.cache,
            self.clock,
            &self.config,
            &round,
            force_regenerate,
        )?;
        Ok(clues.iter().map(CluePublic::from).collect())
    }

    /// Attempt-ordered guess history for an identity in today's round.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn history(
        &self,
        identity: &Identity,
        mode: GameMode,
    ) -> Result<Vec<HistoryEntry>, GameError> {
        let round = self.round_for(mode)?;
        self.ledger().history(self.store, identity, &round)
    }

    /// The identity's most recent guess across all rounds, enriched.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn latest_guess(&self, identity: &Identity) -> Result<Option<HistoryEntry>, GameError> {
        self.ledger().latest_guess(self.store, identity)
    }

    /// Statistics snapshot, optionally scoped to a user and mode subset.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn statistics(
        &self,
        current_user: Option<u64>,
        mode_filter: Option<&[GameMode]>,
    ) -> Result<Snapshot, GameError> {
        StatisticsAggregator::new(
            self.store,
            self.store,
            self.store,
            self.store,
            self.cache,
            self.clock,
            self.config,
        )
        .compute_snapshot(current_user, mode_filter)
    }

    /// Wipe today's gameplay state for a mode: guesses, run facts, and clue
    /// usage. The round itself and its clue set survive so the day's target
    /// stays fixed. Admin/debug facility.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub fn clear_round_state(&self, mode: GameMode) -> Result<(), GameError> {
        let Some(round) = self.store.find_round(self.clock.today(), mode)? else {
            return Ok(());
        };
        self.store.delete_guesses_for_round(round.id)?;
        self.store.delete_runs_for_round(round.id)?;
        self.store.delete_clue_usage_for_round(round.id)?;
        self.cache.forget(&format!("hard_mode_clues:{}", round.id));
        Ok(())
    }

    fn ledger(&self) -> AttemptLedger<'_> {
        AttemptLedger::new(
            self.store,
            self.cache,
            self.clock,
            self.config.history_cache_ttl_seconds,
        )
    }
}
