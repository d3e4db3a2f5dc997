//! Statistics aggregation over rounds, guesses, and run facts.
//!
//! Pure read/aggregate component: it scans the ledgers and the round registry
//! and folds them into one snapshot, optionally cached per
//! (identity, mode filter, day).
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Clock;
use crate::cache::{self, Cache};
use crate::catalog::{CatalogStore, StudentId, StudentSummary};
use crate::clues::HINT_BANDS;
use crate::config::GameConfig;
use crate::error::{GameError, StoreError};
use crate::identity::Identity;
use crate::ledger::{GuessRow, GuessStore};
use crate::modes::GameMode;
use crate::round::{Round, RoundId, RoundStore};

/// Final attempt count for one identity's finished round. Unique on
/// `(identity, round)`; upserted when the round is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRow {
    pub identity: Identity,
    pub round_id: RoundId,
    pub mode: GameMode,
    pub attempts: u32,
}

/// Persistence for run facts.
pub trait RunStore {
    /// Insert or overwrite the run fact for `(identity, round)`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the write.
    fn upsert_run(
        &self,
        identity: &Identity,
        round_id: RoundId,
        mode: GameMode,
        attempts: u32,
    ) -> Result<(), StoreError>;

    /// Every run fact, any order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the scan.
    fn all_runs(&self) -> Result<Vec<RunRow>, StoreError>;

    /// Delete every run fact tied to a round (admin reset).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the delete.
    fn delete_runs_for_round(&self, round_id: RoundId) -> Result<(), StoreError>;
}

/// Difficulty extreme: the student with the highest or lowest average
/// attempts across identities with at least one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyEntry {
    pub student: Option<StudentSummary>,
    pub average: f64,
    pub runs: u64,
}

/// Guess-frequency extreme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub student: Option<StudentSummary>,
    pub guesses: u64,
}

/// Student most often guessed as the first attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstGuessEntry {
    pub student: Option<StudentSummary>,
    pub count: u64,
}

/// Student most often selected as the daily target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalEntry {
    pub student: Option<StudentSummary>,
    pub appearances: u64,
}

/// Current user's rank among all users with completed runs. The percentile is
/// the share of the population performing at or worse (average attempts >=
/// this user's average): fewer attempts is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPercentile {
    pub average_attempts: f64,
    pub runs: u64,
    pub percentile: f64,
    pub total_players: u64,
}

/// Per-mode statistics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSnapshot {
    pub key: String,
    pub name: String,
    pub total_guesses: u64,
    pub user_guesses: u64,
    pub guest_guesses: u64,
    pub runs: u64,
    pub average_attempts: f64,
    pub today_guesses: u64,
    pub today_correct: u64,
}

/// One hint-effectiveness band's share of completed hard-mode runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintBandStat {
    pub label: String,
    pub count: u64,
    pub rate: f64,
}

/// Full statistics snapshot. Field names keep the historical wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub total_guesses: u64,
    pub total_guesses_by_user: u64,
    pub total_guesses_current_user: Option<u64>,
    pub today_guesses: u64,
    pub today_guesses_by_mode: BTreeMap<String, u64>,
    pub today_correct_guesses: u64,
    pub today_correct_guesses_by_mode: BTreeMap<String, u64>,
    pub historical_correct_guesses_by_user: u64,
    pub best_daily_streak: Option<u32>,
    pub current_daily_streak: Option<u32>,
    pub average_guess_per_student: f64,
    pub average_guess_per_student_by_mode: BTreeMap<String, f64>,
    pub average_guess_per_registered_user: f64,
    pub average_guess_current_user: Option<f64>,
    pub hardest_student: Option<DifficultyEntry>,
    pub easiest_student: Option<DifficultyEntry>,
    pub most_guessed_student: Option<FrequencyEntry>,
    pub least_guessed_student: Option<FrequencyEntry>,
    pub most_first_guess_student: Option<FirstGuessEntry>,
    pub most_goal_student: Option<GoalEntry>,
    pub user_percentile: Option<UserPercentile>,
    pub modes: BTreeMap<String, ModeSnapshot>,
    pub hard_mode_hint_success_rates: BTreeMap<String, HintBandStat>,
}

/// Read-only aggregator over the stores.
pub struct StatisticsAggregator<'a> {
    guesses: &'a dyn GuessStore,
    runs: &'a dyn RunStore,
    rounds: &'a dyn RoundStore,
    catalog: &'a dyn CatalogStore,
    cache: &'a dyn Cache,
    clock: &'a dyn Clock,
    config: GameConfig,
}

impl<'a> StatisticsAggregator<'a> {
    #[must_use]
    pub fn new(
        guesses: &'a dyn GuessStore,
        runs: &'a dyn RunStore,
        rounds: &'a dyn RoundStore,
        catalog: &'a dyn CatalogStore,
        cache: &'a dyn Cache,
        clock: &'a dyn Clock,
        config: GameConfig,
    ) -> Self {
        Self {
            guesses,
            runs,
            rounds,
            catalog,
            cache,
            clock,
            config,
        }
    }

    /// Compute (or fetch from cache) the snapshot for an optional current
    /// user and mode filter.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backends.
    pub fn compute_snapshot(
        &self,
        current_user: Option<u64>,
        mode_filter: Option<&[GameMode]>,
    ) -> Result<Snapshot, GameError> {
        if !self.config.statistics_cache_enabled() {
            return self.compile(current_user, mode_filter);
        }

        let key = self.cache_key(current_user, mode_filter);
        if let Some(cached) = cache::get_json::<Snapshot>(self.cache, &key) {
            return Ok(cached);
        }

        let snapshot = self.compile(current_user, mode_filter)?;
        cache::put_json(
            self.cache,
            &key,
            &snapshot,
            self.config.statistics_cache_ttl_seconds,
        );
        Ok(snapshot)
    }

    fn cache_key(&self, current_user: Option<u64>, mode_filter: Option<&[GameMode]>) -> String {
        let user_part = current_user.map_or_else(|| "guest".to_string(), |id| id.to_string());
        let mode_part = mode_filter.map_or_else(
            || "all".to_string(),
            |modes| {
                modes
                    .iter()
                    .map(|mode| mode.key())
                    .collect::<Vec<_>>()
                    .join(",")
            },
        );
        format!(
            "statistics:{user_part}:{mode_part}:{}",
            self.clock.today().format("%Y-%m-%d")
        )
    }

    fn compile(
        &self,
        current_user: Option<u64>,
        mode_filter: Option<&[GameMode]>,
    ) -> Result<Snapshot, GameError> {
        let today = self.clock.today();
        let modes: Vec<GameMode> = mode_filter.map_or_else(|| GameMode::ALL.to_vec(), <[GameMode]>::to_vec);

        let all_guesses = self.guesses.all_guesses()?;
        let all_runs = self.runs.all_runs()?;
        let all_rounds = self.rounds.all_rounds()?;
        let rounds_by_id: HashMap<RoundId, Round> =
            all_rounds.iter().map(|round| (round.id, *round)).collect();

        let total_guesses_by_user = all_guesses
            .iter()
            .filter(|g| matches!(g.identity, Identity::User(_)))
            .count() as u64;
        let total_guesses = all_guesses.len() as u64;
        let total_guesses_current_user = current_user.map(|id| {
            all_guesses
                .iter()
                .filter(|g| g.identity == Identity::User(id))
                .count() as u64
        });

        let today_guesses_by_mode =
            self.guesses_by_mode_for_date(&all_guesses, &rounds_by_id, today, false, &modes);
        let today_correct_guesses_by_mode =
            self.guesses_by_mode_for_date(&all_guesses, &rounds_by_id, today, true, &modes);
        let today_guesses = today_guesses_by_mode.values().sum();
        let today_correct_guesses = today_correct_guesses_by_mode.values().sum();

        let historical_correct_guesses_by_user = all_guesses
            .iter()
            .filter(|g| g.is_correct && matches!(g.identity, Identity::User(_)))
            .count() as u64;

        let (total_attempts, total_runs) = attempt_totals(&all_runs, None, None);
        let (user_attempts, user_runs) =
            attempt_totals(&all_runs, None, Some(IdentityKind::User));
        let average_guess_per_student = safe_average(total_attempts, total_runs);
        let average_guess_per_registered_user = safe_average(user_attempts, user_runs);

        let mut average_guess_per_student_by_mode = BTreeMap::new();
        for mode in &modes {
            let (attempts, runs) = attempt_totals(&all_runs, Some(*mode), None);
            average_guess_per_student_by_mode
                .insert(mode.key().to_string(), safe_average(attempts, runs));
        }

        let average_guess_current_user = current_user.map(|id| {
            let identity = Identity::User(id);
            let (attempts, runs) = identity_totals(&all_runs, &identity);
            safe_average(attempts, runs)
        });

        let (hardest_student, easiest_student) =
            self.difficulty_extremes(&all_runs, &rounds_by_id);
        let most_goal_student = self.most_goal(&all_rounds);
        let (most_guessed_student, least_guessed_student) = self.frequency_extremes(&all_guesses);
        let most_first_guess_student = self.most_first_guess(&all_guesses);

        let (best_daily_streak, current_daily_streak) = match current_user {
            Some(id) => {
                let (best, current) =
                    streaks_for_user(&all_runs, &rounds_by_id, &Identity::User(id));
                (Some(best), Some(current))
            }
            None => (None, None),
        };

        let user_percentile = current_user.and_then(|id| percentile_for_user(&all_runs, id));

        let mut mode_snapshots = BTreeMap::new();
        for mode in &modes {
            mode_snapshots.insert(
                mode.key().to_string(),
                self.mode_snapshot(*mode, &all_guesses, &all_runs, &rounds_by_id, today),
            );
        }

        let hard_mode_hint_success_rates = hint_success_rates(&all_runs);

        Ok(Snapshot {
            total_guesses,
            total_guesses_by_user,
            total_guesses_current_user,
            today_guesses,
            today_guesses_by_mode,
            today_correct_guesses,
            today_correct_guesses_by_mode,
            historical_correct_guesses_by_user,
            best_daily_streak,
            current_daily_streak,
            average_guess_per_student,
            average_guess_per_student_by_mode,
            average_guess_per_registered_user,
            average_guess_current_user,
            hardest_student,
            easiest_student,
            most_guessed_student,
            least_guessed_student,
            most_first_guess_student,
            most_goal_student,
            user_percentile,
            modes: mode_snapshots,
            hard_mode_hint_success_rates,
        })
    }

    /// Per-mode guess counts for one calendar day; only modes with at least
    /// one guess appear in the map.
    fn guesses_by_mode_for_date(
        &self,
        guesses: &[GuessRow],
        rounds_by_id: &HashMap<RoundId, Round>,
        date: NaiveDate,
        only_correct: bool,
        modes: &[GameMode],
    ) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for guess in guesses {
            if only_correct && !guess.is_correct {
                continue;
            }
            let Some(round) = rounds_by_id.get(&guess.round_id) else {
                continue;
            };
            if round.played_on != date || !modes.contains(&round.mode) {
                continue;
            }
            *counts.entry(round.mode.key().to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn difficulty_extremes(
        &self,
        runs: &[RunRow],
        rounds_by_id: &HashMap<RoundId, Round>,
    ) -> (Option<DifficultyEntry>, Option<DifficultyEntry>) {
        let mut totals: BTreeMap<StudentId, (u64, u64)> = BTreeMap::new();
        for run in runs {
            let Some(round) = rounds_by_id.get(&run.round_id) else {
                continue;
            };
            let entry = totals.entry(round.student_id).or_insert((0, 0));
            entry.0 += u64::from(run.attempts);
            entry.1 += 1;
        }

        let mut hardest: Option<DifficultyEntry> = None;
        let mut easiest: Option<DifficultyEntry> = None;
        for (student_id, (attempts, run_count)) in totals {
            if run_count == 0 {
                continue;
            }
            let average = safe_average(attempts, run_count);
            if hardest.as_ref().is_none_or(|best| average > best.average) {
                hardest = Some(DifficultyEntry {
                    student: self.summary(student_id),
                    average,
                    runs: run_count,
                });
            }
            if easiest.as_ref().is_none_or(|best| average < best.average) {
                easiest = Some(DifficultyEntry {
                    student: self.summary(student_id),
                    average,
                    runs: run_count,
                });
            }
        }
        (hardest, easiest)
    }

    fn most_goal(&self, rounds: &[Round]) -> Option<GoalEntry> {
        let mut appearances: BTreeMap<StudentId, u64> = BTreeMap::new();
        for round in rounds {
            *appearances.entry(round.student_id).or_insert(0) += 1;
        }
        let (student_id, count) = appearances
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))?;
        Some(GoalEntry {
            student: self.summary(student_id),
            appearances: count,
        })
    }

    fn frequency_extremes(
        &self,
        guesses: &[GuessRow],
    ) -> (Option<FrequencyEntry>, Option<FrequencyEntry>) {
        let mut counts: BTreeMap<StudentId, u64> = BTreeMap::new();
        for guess in guesses {
            *counts.entry(guess.student_id).or_insert(0) += 1;
        }

        let mut most: Option<(StudentId, u64)> = None;
        let mut least: Option<(StudentId, u64)> = None;
        for (student_id, count) in counts {
            if count == 0 {
                continue;
            }
            if most.is_none_or(|(_, best)| count > best) {
                most = Some((student_id, count));
            }
            if least.is_none_or(|(_, best)| count < best) {
                least = Some((student_id, count));
            }
        }

        let to_entry = |pair: (StudentId, u64)| FrequencyEntry {
            student: self.summary(pair.0),
            guesses: pair.1,
        };
        (most.map(to_entry), least.map(to_entry))
    }

    fn most_first_guess(&self, guesses: &[GuessRow]) -> Option<FirstGuessEntry> {
        let mut counts: BTreeMap<StudentId, u64> = BTreeMap::new();
        for guess in guesses {
            if guess.attempt_number == 1 {
                *counts.entry(guess.student_id).or_insert(0) += 1;
            }
        }

        let mut top: Option<(StudentId, u64)> = None;
        for (student_id, count) in counts {
            if top.is_none_or(|(_, best)| count > best) {
                top = Some((student_id, count));
            }
        }
        top.map(|(student_id, count)| FirstGuessEntry {
            student: self.summary(student_id),
            count,
        })
    }

    fn mode_snapshot(
        &self,
        mode: GameMode,
        guesses: &[GuessRow],
        runs: &[RunRow],
        rounds_by_id: &HashMap<RoundId, Round>,
        today: NaiveDate,
    ) -> ModeSnapshot {
        let in_mode = |round_id: RoundId| {
            rounds_by_id
                .get(&round_id)
                .is_some_and(|round| round.mode == mode)
        };

        let user_guesses = guesses
            .iter()
            .filter(|g| in_mode(g.round_id) && matches!(g.identity, Identity::User(_)))
            .count() as u64;
        let guest_guesses = guesses
            .iter()
            .filter(|g| in_mode(g.round_id) && matches!(g.identity, Identity::Guest(_)))
            .count() as u64;

        let (attempts, run_count) = attempt_totals(runs, Some(mode), None);
        let today_map =
            self.guesses_by_mode_for_date(guesses, rounds_by_id, today, false, &[mode]);
        let today_correct_map =
            self.guesses_by_mode_for_date(guesses, rounds_by_id, today, true, &[mode]);

        ModeSnapshot {
            key: mode.key().to_string(),
            name: mode.name().to_string(),
            total_guesses: user_guesses + guest_guesses,
            user_guesses,
            guest_guesses,
            runs: run_count,
            average_attempts: safe_average(attempts, run_count),
            today_guesses: today_map.get(mode.key()).copied().unwrap_or(0),
            today_correct: today_correct_map.get(mode.key()).copied().unwrap_or(0),
        }
    }

    fn summary(&self, student_id: StudentId) -> Option<StudentSummary> {
        self.catalog
            .student_by_id(student_id)
            .map(|student| student.summary())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentityKind {
    User,
}

fn attempt_totals(
    runs: &[RunRow],
    mode: Option<GameMode>,
    kind: Option<IdentityKind>,
) -> (u64, u64) {
    let mut attempts = 0u64;
    let mut count = 0u64;
    for run in runs {
        if mode.is_some_and(|m| run.mode != m) {
            continue;
        }
        if kind == Some(IdentityKind::User) && !matches!(run.identity, Identity::User(_)) {
            continue;
        }
        attempts += u64::from(run.attempts);
        count += 1;
    }
    (attempts, count)
}

fn identity_totals(runs: &[RunRow], identity: &Identity) -> (u64, u64) {
    let mut attempts = 0u64;
    let mut count = 0u64;
    for run in runs.iter().filter(|run| &run.identity == identity) {
        attempts += u64::from(run.attempts);
        count += 1;
    }
    (attempts, count)
}

/// Best and current daily-play streaks from the distinct set of dates the
/// user finished a round on. The current streak walks dates descending from
/// the most recent play date, extending while each next date is exactly one
/// day earlier.
fn streaks_for_user(
    runs: &[RunRow],
    rounds_by_id: &HashMap<RoundId, Round>,
    identity: &Identity,
) -> (u32, u32) {
    let mut dates: Vec<NaiveDate> = runs
        .iter()
        .filter(|run| &run.identity == identity)
        .filter_map(|run| rounds_by_id.get(&run.round_id).map(|round| round.played_on))
        .collect();
    dates.sort_unstable();
    dates.dedup();

    if dates.is_empty() {
        return (0, 0);
    }

    let mut best = 0u32;
    let mut running = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for date in &dates {
        running = match previous {
            Some(prev) if prev.succ_opt() == Some(*date) => running + 1,
            _ => 1,
        };
        best = best.max(running);
        previous = Some(*date);
    }

    let mut current = 0u32;
    let mut expected: Option<NaiveDate> = None;
    for date in dates.iter().rev() {
        match expected {
            None => {
                current = 1;
                expected = date.pred_opt();
            }
            Some(want) if *date == want => {
                current += 1;
                expected = date.pred_opt();
            }
            Some(_) => break,
        }
    }

    (best, current)
}

/// Percentile among all users with at least one completed run: the share of
/// users whose average attempts is at or above (i.e. at or worse than) this
/// user's average.
fn percentile_for_user(runs: &[RunRow], user_id: u64) -> Option<UserPercentile> {
    let mut per_user: HashMap<u64, (u64, u64)> = HashMap::new();
    for run in runs {
        if let Identity::User(id) = run.identity {
            let entry = per_user.entry(id).or_insert((0, 0));
            entry.0 += u64::from(run.attempts);
            entry.1 += 1;
        }
    }

    let (attempts, run_count) = per_user.get(&user_id).copied()?;
    if run_count == 0 {
        return None;
    }
    let target_average = attempts as f64 / run_count as f64;

    let total_players = per_user.len() as u64;
    let beaten = per_user
        .values()
        .filter(|(attempts, runs)| {
            *runs > 0 && (*attempts as f64 / *runs as f64) >= target_average
        })
        .count() as u64;

    Some(UserPercentile {
        average_attempts: round2(target_average),
        runs: run_count,
        percentile: round2(beaten as f64 / total_players as f64 * 100.0),
        total_players,
    })
}

/// Band completed hard-mode runs by final attempt count. Empty when no
/// hard-mode runs exist.
fn hint_success_rates(runs: &[RunRow]) -> BTreeMap<String, HintBandStat> {
    let attempts: Vec<u32> = runs
        .iter()
        .filter(|run| run.mode == GameMode::Hard)
        .map(|run| run.attempts)
        .collect();
    if attempts.is_empty() {
        return BTreeMap::new();
    }

    let mut totals: Vec<(&'static str, &'static str, u64)> = HINT_BANDS
        .iter()
        .map(|band| (band.key, band.label, 0u64))
        .collect();
    for attempt in &attempts {
        for (index, band) in HINT_BANDS.iter().enumerate() {
            if band.contains(*attempt) {
                totals[index].2 += 1;
            }
        }
    }

    let grand_total: u64 = totals.iter().map(|(_, _, count)| *count).sum();
    if grand_total == 0 {
        return BTreeMap::new();
    }

    totals
        .into_iter()
        .map(|(key, label, count)| {
            (
                key.to_string(),
                HintBandStat {
                    label: label.to_string(),
                    count,
                    rate: round2(count as f64 / grand_total as f64 * 100.0),
                },
            )
        })
        .collect()
}

fn safe_average(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        round2(total as f64 / count as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("valid date")
    }

    fn run(user: u64, round_id: RoundId, attempts: u32) -> RunRow {
        RunRow {
            identity: Identity::User(user),
            round_id,
            mode: GameMode::Classic,
            attempts,
        }
    }

    fn rounds(dates: &[(RoundId, &str)]) -> HashMap<RoundId, Round> {
        dates
            .iter()
            .map(|(id, day)| {
                (
                    *id,
                    Round {
                        id: *id,
                        played_on: date(day),
                        mode: GameMode::Classic,
                        student_id: 1,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn streaks_count_consecutive_days_and_stop_at_gaps() {
        let rounds = rounds(&[
            (1, "2025-01-01"),
            (2, "2025-01-02"),
            (3, "2025-01-03"),
            (4, "2025-01-05"),
        ]);
        let runs = vec![run(1, 1, 3), run(1, 2, 2), run(1, 3, 4), run(1, 4, 1)];
        let (best, current) = streaks_for_user(&runs, &rounds, &Identity::User(1));
        assert_eq!(best, 3);
        // Jan 4 is missing, so the walk back from Jan 5 stops immediately.
        assert_eq!(current, 1);
    }

    #[test]
    fn unbroken_run_counts_fully_for_both_streaks() {
        let rounds = rounds(&[(1, "2025-01-01"), (2, "2025-01-02"), (3, "2025-01-03")]);
        let runs = vec![run(1, 1, 1), run(1, 2, 1), run(1, 3, 1)];
        let (best, current) = streaks_for_user(&runs, &rounds, &Identity::User(1));
        assert_eq!(best, 3);
        assert_eq!(current, 3);
    }

    #[test]
    fn duplicate_dates_do_not_inflate_streaks() {
        let mut map = rounds(&[(1, "2025-01-01"), (2, "2025-01-02")]);
        map.insert(
            3,
            Round {
                id: 3,
                played_on: date("2025-01-02"),
                mode: GameMode::Hard,
                student_id: 2,
            },
        );
        let runs = vec![run(1, 1, 1), run(1, 2, 1), run(1, 3, 1)];
        let (best, current) = streaks_for_user(&runs, &map, &Identity::User(1));
        assert_eq!(best, 2);
        assert_eq!(current, 2);
    }

    #[test]
    fn percentile_counts_users_at_or_worse() {
        // user 1 avg 2.0, user 2 avg 5.0, user 3 avg 2.0
        let runs = vec![run(1, 1, 2), run(2, 1, 5), run(3, 1, 2)];
        let p1 = percentile_for_user(&runs, 1).unwrap();
        // All three users average >= 2.0.
        assert!((p1.percentile - 100.0).abs() < f64::EPSILON);
        let p2 = percentile_for_user(&runs, 2).unwrap();
        // Only user 2 averages >= 5.0.
        assert!((p2.percentile - 33.33).abs() < 0.01);
    }

    #[test]
    fn percentile_never_drops_when_a_worse_user_joins() {
        let mut runs = vec![run(1, 1, 2), run(2, 1, 4)];
        let before = percentile_for_user(&runs, 1).unwrap().percentile;
        runs.push(run(3, 1, 9));
        let after = percentile_for_user(&runs, 1).unwrap().percentile;
        assert!(after >= before);
    }

    #[test]
    fn percentile_missing_for_users_without_runs() {
        let runs = vec![run(2, 1, 4)];
        assert!(percentile_for_user(&runs, 1).is_none());
    }

    #[test]
    fn hint_bands_report_counts_and_rates() {
        let mut runs: Vec<RunRow> = [2, 4, 5, 12]
            .iter()
            .map(|attempts| RunRow {
                identity: Identity::Guest(format!("t{attempts}")),
                round_id: 1,
                mode: GameMode::Hard,
                attempts: *attempts,
            })
            .collect();
        // Classic runs never contribute to hint bands.
        runs.push(run(1, 2, 30));

        let bands = hint_success_rates(&runs);
        assert_eq!(bands["no_extra_hints"].count, 2);
        assert_eq!(bands["medium_hints"].count, 1);
        assert_eq!(bands["final_hint"].count, 1);
        assert!((bands["no_extra_hints"].rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hint_bands_empty_without_hard_runs() {
        let runs = vec![run(1, 1, 3)];
        assert!(hint_success_rates(&runs).is_empty());
    }

    #[test]
    fn safe_average_rounds_to_two_decimals() {
        assert!((safe_average(10, 3) - 3.33).abs() < f64::EPSILON);
        assert!((safe_average(0, 0) - 0.0).abs() < f64::EPSILON);
    }
}
