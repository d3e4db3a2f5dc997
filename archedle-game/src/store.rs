//! Store composition and the in-memory reference backend.
use std::cell::RefCell;

use chrono::NaiveDate;

use crate::catalog::{CatalogStore, Student, StudentId};
use crate::clues::{Clue, ClueDraft, ClueStore, ClueUsage, ClueUsageStore};
use crate::error::StoreError;
use crate::ledger::{GuessRow, GuessStore, NewGuess};
use crate::modes::GameMode;
use crate::round::{Round, RoundId, RoundStore};
use crate::stats::{RunRow, RunStore};

/// Everything the engine needs from a backend, as one bound. Blanket-derived;
/// a platform implements the six store traits and gets this for free.
pub trait GameStore:
    CatalogStore + RoundStore + GuessStore + RunStore + ClueStore + ClueUsageStore
{
}

impl<T> GameStore for T where
    T: CatalogStore + RoundStore + GuessStore + RunStore + ClueStore + ClueUsageStore
{
}

/// In-memory backend. Single-threaded interior mutability; the reference
/// implementation for the store traits and the backend the tests run on.
///
/// Uniqueness constraints match what a relational backend would enforce:
/// rounds on `(played_on, mode)`, guesses on `(identity, round, student)`,
/// clues on `(round, display_order)`, clue usage on
/// `(clue, player_identifier)`, runs upserted on `(identity, round)`.
pub struct MemoryStore {
    students: Vec<Student>,
    rounds: RefCell<Vec<Round>>,
    guesses: RefCell<Vec<GuessRow>>,
    runs: RefCell<Vec<RunRow>>,
    clues: RefCell<Vec<Clue>>,
    clue_usage: RefCell<Vec<ClueUsage>>,
    next_round_id: RefCell<RoundId>,
    next_guess_id: RefCell<u64>,
    next_clue_id: RefCell<u64>,
}

impl MemoryStore {
    /// Build a store over a catalog; students are kept in ascending-id order.
    #[must_use]
    pub fn new(mut students: Vec<Student>) -> Self {
        students.sort_by_key(|student| student.id);
        Self {
            students,
            rounds: RefCell::new(Vec::new()),
            guesses: RefCell::new(Vec::new()),
            runs: RefCell::new(Vec::new()),
            clues: RefCell::new(Vec::new()),
            clue_usage: RefCell::new(Vec::new()),
            next_round_id: RefCell::new(1),
            next_guess_id: RefCell::new(1),
            next_clue_id: RefCell::new(1),
        }
    }

    fn take_round_id(&self) -> RoundId {
        let mut next = self.next_round_id.borrow_mut();
        let id = *next;
        *next += 1;
        id
    }

    fn take_guess_id(&self) -> u64 {
        let mut next = self.next_guess_id.borrow_mut();
        let id = *next;
        *next += 1;
        id
    }

    fn take_clue_id(&self) -> u64 {
        let mut next = self.next_clue_id.borrow_mut();
        let id = *next;
        *next += 1;
        id
    }
}

impl CatalogStore for MemoryStore {
    fn student_count(&self) -> usize {
        self.students.len()
    }

    fn student_id_at(&self, offset: usize) -> Option<StudentId> {
        self.students.get(offset).map(|student| student.id)
    }

    fn first_student_id(&self) -> Option<StudentId> {
        self.students.first().map(|student| student.id)
    }

    fn student_by_id(&self, id: StudentId) -> Option<Student> {
        self.students
            .iter()
            .find(|student| student.id == id)
            .cloned()
    }

    fn all_students(&self) -> Vec<Student> {
        self.students.clone()
    }
}

impl RoundStore for MemoryStore {
    fn find_round(&self, date: NaiveDate, mode: GameMode) -> Result<Option<Round>, StoreError> {
        Ok(self
            .rounds
            .borrow()
            .iter()
            .find(|round| round.played_on == date && round.mode == mode)
            .copied())
    }

    fn insert_round(
        &self,
        date: NaiveDate,
        mode: GameMode,
        student_id: StudentId,
    ) -> Result<Round, StoreError> {
        let mut rounds = self.rounds.borrow_mut();
        if rounds
            .iter()
            .any(|round| round.played_on == date && round.mode == mode)
        {
            return Err(StoreError::Conflict("round (played_on, mode)"));
        }
        let round = Round {
            id: self.take_round_id(),
            played_on: date,
            mode,
            student_id,
        };
        rounds.push(round);
        Ok(round)
    }

    fn round_by_id(&self, id: RoundId) -> Result<Option<Round>, StoreError> {
        Ok(self
            .rounds
            .borrow()
            .iter()
            .find(|round| round.id == id)
            .copied())
    }

    fn all_rounds(&self) -> Result<Vec<Round>, StoreError> {
        Ok(self.rounds.borrow().clone())
    }
}

impl GuessStore for MemoryStore {
    fn find_guess(
        &self,
        identity: &crate::identity::Identity,
        round_id: RoundId,
        student_id: StudentId,
    ) -> Result<Option<GuessRow>, StoreError> {
        Ok(self
            .guesses
            .borrow()
            .iter()
            .find(|guess| {
                &guess.identity == identity
                    && guess.round_id == round_id
                    && guess.student_id == student_id
            })
            .cloned())
    }

    fn insert_guess(&self, guess: NewGuess) -> Result<GuessRow, StoreError> {
        let mut guesses = self.guesses.borrow_mut();
        if guesses.iter().any(|existing| {
            existing.identity == guess.identity
                && existing.round_id == guess.round_id
                && existing.student_id == guess.student_id
        }) {
            return Err(StoreError::Conflict("guess (identity, round, student)"));
        }
        let row = GuessRow {
            id: self.take_guess_id(),
            identity: guess.identity,
            round_id: guess.round_id,
            student_id: guess.student_id,
            attempt_number: guess.attempt_number,
            is_correct: guess.is_correct,
            guess_text: guess.guess_text,
            matches: guess.matches,
            height_status: guess.height_status,
            created_at: guess.created_at,
        };
        guesses.push(row.clone());
        Ok(row)
    }

    fn guesses_for(
        &self,
        identity: &crate::identity::Identity,
        round_id: RoundId,
    ) -> Result<Vec<GuessRow>, StoreError> {
        let mut rows: Vec<GuessRow> = self
            .guesses
            .borrow()
            .iter()
            .filter(|guess| &guess.identity == identity && guess.round_id == round_id)
            .cloned()
            .collect();
        rows.sort_by_key(|guess| guess.attempt_number);
        Ok(rows)
    }

    fn latest_guess(
        &self,
        identity: &crate::identity::Identity,
    ) -> Result<Option<GuessRow>, StoreError> {
        // Insertion-order id breaks ties between identical timestamps.
        Ok(self
            .guesses
            .borrow()
            .iter()
            .filter(|guess| &guess.identity == identity)
            .max_by_key(|guess| (guess.created_at, guess.id))
            .cloned())
    }

    fn all_guesses(&self) -> Result<Vec<GuessRow>, StoreError> {
        Ok(self.guesses.borrow().clone())
    }

    fn delete_guesses_for_round(&self, round_id: RoundId) -> Result<(), StoreError> {
        self.guesses
            .borrow_mut()
            .retain(|guess| guess.round_id != round_id);
        Ok(())
    }
}

impl RunStore for MemoryStore {
    fn upsert_run(
        &self,
        identity: &crate::identity::Identity,
        round_id: RoundId,
        mode: GameMode,
        attempts: u32,
    ) -> Result<(), StoreError> {
        let mut runs = self.runs.borrow_mut();
        if let Some(existing) = runs
            .iter_mut()
            .find(|run| &run.identity == identity && run.round_id == round_id)
        {
            existing.mode = mode;
            existing.attempts = attempts;
            return Ok(());
        }
        runs.push(RunRow {
            identity: identity.clone(),
            round_id,
            mode,
            attempts,
        });
        Ok(())
    }

    fn all_runs(&self) -> Result<Vec<RunRow>, StoreError> {
        Ok(self.runs.borrow().clone())
    }

    fn delete_runs_for_round(&self, round_id: RoundId) -> Result<(), StoreError> {
        self.runs.borrow_mut().retain(|run| run.round_id != round_id);
        Ok(())
    }
}

impl ClueStore for MemoryStore {
    fn clues_for_round(&self, round_id: RoundId) -> Result<Vec<Clue>, StoreError> {
        let mut rows: Vec<Clue> = self
            .clues
            .borrow()
            .iter()
            .filter(|clue| clue.round_id == round_id)
            .cloned()
            .collect();
        rows.sort_by_key(|clue| clue.display_order);
        Ok(rows)
    }

    fn insert_clue(
        &self,
        round_id: RoundId,
        display_order: u32,
        draft: &ClueDraft,
    ) -> Result<Clue, StoreError> {
        let mut clues = self.clues.borrow_mut();
        if clues
            .iter()
            .any(|clue| clue.round_id == round_id && clue.display_order == display_order)
        {
            return Err(StoreError::Conflict("clue (round, display_order)"));
        }
        let clue = Clue {
            id: self.take_clue_id(),
            round_id,
            display_order,
            label: draft.label.to_string(),
            value: draft.value.clone(),
            difficulty: draft.difficulty,
            field: draft.field.clone(),
            pair: draft.pair.clone(),
        };
        clues.push(clue.clone());
        Ok(clue)
    }

    fn delete_clues_for_round(&self, round_id: RoundId) -> Result<(), StoreError> {
        self.clues
            .borrow_mut()
            .retain(|clue| clue.round_id != round_id);
        Ok(())
    }
}

impl ClueUsageStore for MemoryStore {
    fn insert_clue_usage(&self, usage: ClueUsage) -> Result<(), StoreError> {
        let mut rows = self.clue_usage.borrow_mut();
        if rows.iter().any(|existing| {
            existing.clue_id == usage.clue_id
                && existing.player_identifier == usage.player_identifier
        }) {
            return Err(StoreError::Conflict("clue usage (clue, player)"));
        }
        rows.push(usage);
        Ok(())
    }

    fn delete_clue_usage_for_round(&self, round_id: RoundId) -> Result<(), StoreError> {
        self.clue_usage
            .borrow_mut()
            .retain(|usage| usage.round_id != round_id);
        Ok(())
    }
}

impl MemoryStore {
    /// Usage rows for a round, in insertion order. Test and debug visibility.
    #[must_use]
    pub fn clue_usage_for_round(&self, round_id: RoundId) -> Vec<ClueUsage> {
        self.clue_usage
            .borrow()
            .iter()
            .filter(|usage| usage.round_id == round_id)
            .cloned()
            .collect()
    }
}
