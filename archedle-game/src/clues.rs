//! Hard-mode clues: daily attribute reveals with difficulty tiers.
//!
//! A fixed pool of attributes exists per tier; a seeded CRC32 ranking picks a
//! daily subset so the clue set is stable within a day but varies between
//! days and targets. Clue usage is logged per identity once an attempt count
//! crosses a clue's reveal threshold.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::Clock;
use crate::cache::{self, Cache};
use crate::catalog::{CatalogStore, Student};
use crate::config::GameConfig;
use crate::error::{GameError, StoreError};
use crate::identity::Identity;
use crate::modes::GameMode;
use crate::round::{Round, RoundId};

/// Identifier of a persisted clue.
pub type ClueId = u64;

/// Difficulty tier controlling which attributes are exposed, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueTier {
    Always,
    Easy,
    Medium,
    Hard,
}

/// A persisted clue row. Unique per `(round, display_order)`; display order 0
/// is the image clue and is always visible regardless of attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub id: ClueId,
    pub round_id: RoundId,
    pub display_order: u32,
    pub label: String,
    pub value: String,
    pub difficulty: ClueTier,
    /// Field label used by the match handler UI.
    pub field: Option<String>,
    /// Source attribute key for per-field comparison. For equipment clues
    /// this carries the previously processed scalar key (or nothing when
    /// equipment ranks first in its tier) - only that key stays matchable.
    pub pair: Option<String>,
}

/// Public projection of a clue; internal `field`/`pair` columns are withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CluePublic {
    pub label: String,
    pub value: String,
    pub difficulty: ClueTier,
}

impl From<&Clue> for CluePublic {
    fn from(clue: &Clue) -> Self {
        Self {
            label: clue.label.clone(),
            value: clue.value.clone(),
            difficulty: clue.difficulty,
        }
    }
}

/// Clue data before persistence assigns id and display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueDraft {
    pub label: &'static str,
    pub value: String,
    pub difficulty: ClueTier,
    pub field: Option<String>,
    pub pair: Option<String>,
}

/// Persistence for clue rows.
pub trait ClueStore {
    /// Clues for a round ordered by display order ascending.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the scan.
    fn clues_for_round(&self, round_id: RoundId) -> Result<Vec<Clue>, StoreError>;

    /// Insert one clue at a display order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when `(round, display_order)` already
    /// exists.
    fn insert_clue(
        &self,
        round_id: RoundId,
        display_order: u32,
        draft: &ClueDraft,
    ) -> Result<Clue, StoreError>;

    /// Delete every clue of a round (force-regeneration).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the delete.
    fn delete_clues_for_round(&self, round_id: RoundId) -> Result<(), StoreError>;
}

/// Recorded exposure of one clue to one identity. Written once, never
/// updated; unique on `(clue, player_identifier)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueUsage {
    pub clue_id: ClueId,
    pub round_id: RoundId,
    pub display_order: u32,
    /// Attribute key the clue exposes: `pair`, else `field`, else label.
    pub clue_key: String,
    pub label: String,
    pub difficulty: ClueTier,
    pub player_identifier: String,
    pub player_type: String,
    pub user_id: Option<u64>,
    pub guest_token: Option<String>,
    pub attempt_number: u32,
}

/// Persistence for clue-usage rows.
pub trait ClueUsageStore {
    /// Insert a usage row; first write wins.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when `(clue, player_identifier)` was
    /// already recorded.
    fn insert_clue_usage(&self, usage: ClueUsage) -> Result<(), StoreError>;

    /// Delete every usage row tied to a round (admin reset).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot serve the delete.
    fn delete_clue_usage_for_round(&self, round_id: RoundId) -> Result<(), StoreError>;
}

/// Where a clue's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClueSource {
    /// One scalar student column.
    Field(&'static str),
    /// The three equipment slots joined with ", ".
    Equipment,
}

type Pool = &'static [(&'static str, ClueSource)];

const ALWAYS_POOL: Pool = &[("Image", ClueSource::Field("image"))];

const HARD_POOL: Pool = &[
    ("Position", ClueSource::Field("position")),
    ("Weapon Type", ClueSource::Field("weapon_type")),
    ("Equipment", ClueSource::Equipment),
    ("Armor Type", ClueSource::Field("armor_type")),
    ("Height", ClueSource::Field("height")),
];

const MEDIUM_POOL: Pool = &[
    ("Age", ClueSource::Field("age")),
    ("Role", ClueSource::Field("role")),
    ("Unique Equipment", ClueSource::Field("unique_equipment_name")),
    ("Damage Type", ClueSource::Field("damage_type")),
];

const EASY_POOL: Pool = &[
    ("School", ClueSource::Field("school")),
    ("Class", ClueSource::Field("class")),
    ("Club", ClueSource::Field("club")),
];

const HARD_COUNT: usize = 3;
const MEDIUM_COUNT: usize = 2;
const EASY_COUNT: usize = 1;

/// Attempt threshold per display order: the attempt number at which the clue
/// counts as revealed. Orders absent from the table never reveal through
/// this mechanism; order 0 (image) is excluded as always visible.
const DISPLAY_ORDER_THRESHOLDS: [(u32, u32); 6] = [(1, 0), (2, 0), (3, 0), (4, 5), (5, 6), (6, 10)];

/// Reveal threshold for a display order, if the order is gated at all.
#[must_use]
pub fn threshold_for_order(display_order: u32) -> Option<u32> {
    DISPLAY_ORDER_THRESHOLDS
        .iter()
        .find(|(order, _)| *order == display_order)
        .map(|(_, threshold)| *threshold)
}

/// Attempt band for hint-effectiveness reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintBand {
    pub key: &'static str,
    pub label: &'static str,
    pub min: u32,
    pub max: Option<u32>,
}

impl HintBand {
    /// Whether a final attempt count falls in this band.
    #[must_use]
    pub fn contains(&self, attempts: u32) -> bool {
        attempts >= self.min && self.max.is_none_or(|max| attempts <= max)
    }
}

/// Final-attempt bands used by the statistics aggregator.
pub const HINT_BANDS: [HintBand; 3] = [
    HintBand {
        key: "no_extra_hints",
        label: "Solved before extra hints",
        min: 0,
        max: Some(4),
    },
    HintBand {
        key: "medium_hints",
        label: "Solved after medium hints",
        min: 5,
        max: Some(9),
    },
    HintBand {
        key: "final_hint",
        label: "Solved after final hint",
        min: 10,
        max: None,
    },
];

/// Retrieve (or generate) the clue set for a hard-mode round.
///
/// Non-forced calls on the same round return byte-identical sets: cache
/// first, then store, regenerating only when no clues exist. Forcing deletes
/// the stored set and salts the seed with the current timestamp so the new
/// selection may differ. A round whose target is missing from the catalog
/// yields an empty set.
///
/// # Errors
///
/// Propagates [`StoreError`] from the backend.
pub fn daily_clues(
    store: &dyn ClueStore,
    catalog: &dyn CatalogStore,
    cache_store: &dyn Cache,
    clock: &dyn Clock,
    config: &GameConfig,
    round: &Round,
    force_regenerate: bool,
) -> Result<Vec<Clue>, GameError> {
    let cache_key = clue_cache_key(round.id);
    let ttl = clue_cache_ttl(config, clock);

    if !force_regenerate
        && let Some(cached) = cache::get_json::<Vec<Clue>>(cache_store, &cache_key)
    {
        return Ok(cached);
    }

    if force_regenerate {
        log::debug!("force-regenerating clues for round {}", round.id);
        cache_store.forget(&cache_key);
        store.delete_clues_for_round(round.id)?;
    }

    let existing = store.clues_for_round(round.id)?;
    if !existing.is_empty() {
        cache::put_json(cache_store, &cache_key, &existing, ttl);
        return Ok(existing);
    }

    let Some(student) = catalog.student_by_id(round.student_id) else {
        let empty: Vec<Clue> = Vec::new();
        cache::put_json(cache_store, &cache_key, &empty, ttl);
        return Ok(empty);
    };

    let drafts = generate_clues(&student, clock.today(), force_regenerate, clock);
    let mut persisted = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.iter().enumerate() {
        let display_order = u32::try_from(index).unwrap_or(u32::MAX);
        match store.insert_clue(round.id, display_order, draft) {
            Ok(clue) => persisted.push(clue),
            Err(StoreError::Conflict(_)) => {
                // A concurrent first access won the generation race; theirs
                // is the canonical set.
                let winner = store.clues_for_round(round.id)?;
                cache::put_json(cache_store, &cache_key, &winner, ttl);
                return Ok(winner);
            }
            Err(err) => return Err(err.into()),
        }
    }

    cache::put_json(cache_store, &cache_key, &persisted, ttl);
    Ok(persisted)
}

/// Deterministically derive the daily clue drafts for a student.
///
/// Emission order is fixed: the always-visible image clue, then the hard,
/// medium, and easy tier picks in pool order.
#[must_use]
pub fn generate_clues(
    student: &Student,
    date: NaiveDate,
    force_regenerate: bool,
    clock: &dyn Clock,
) -> SmallVec<[ClueDraft; 7]> {
    let mut seed = format!("{}|hard|{}", date.format("%Y-%m-%d"), student.id);
    if force_regenerate {
        seed.push_str(&format!("|regen|{}", clock.now().timestamp_micros()));
    }

    let hard = pluck_deterministic(HARD_POOL, HARD_COUNT, &format!("{seed}|hard"));
    let medium = pluck_deterministic(MEDIUM_POOL, MEDIUM_COUNT, &format!("{seed}|medium"));
    let easy = pluck_deterministic(EASY_POOL, EASY_COUNT, &format!("{seed}|easy"));

    let mut drafts = SmallVec::new();
    drafts.extend(tier_clues(ALWAYS_POOL, student, ClueTier::Always));
    drafts.extend(tier_clues(&hard, student, ClueTier::Hard));
    drafts.extend(tier_clues(&medium, student, ClueTier::Medium));
    drafts.extend(tier_clues(&easy, student, ClueTier::Easy));
    drafts
}

/// Pick `count` pool entries by ranking CRC32(`seed|label`) ascending, then
/// return the picks in pool order. Pools no larger than `count` pass through
/// unranked.
fn pluck_deterministic(
    pool: Pool,
    count: usize,
    seed: &str,
) -> Vec<(&'static str, ClueSource)> {
    if count >= pool.len() {
        return pool.to_vec();
    }

    let mut ranked: Vec<(u32, usize)> = pool
        .iter()
        .enumerate()
        .map(|(index, (label, _))| (crc32fast::hash(format!("{seed}|{label}").as_bytes()), index))
        .collect();
    ranked.sort_by_key(|(hash, _)| *hash);
    ranked.truncate(count);

    let selected: Vec<usize> = ranked.into_iter().map(|(_, index)| index).collect();
    pool.iter()
        .enumerate()
        .filter(|(index, _)| selected.contains(index))
        .map(|(_, entry)| *entry)
        .collect()
}

fn tier_clues(
    attributes: &[(&'static str, ClueSource)],
    student: &Student,
    difficulty: ClueTier,
) -> Vec<ClueDraft> {
    let mut drafts = Vec::with_capacity(attributes.len());
    // Carried across the loop: an equipment clue inherits the key of the
    // scalar attribute processed before it.
    let mut pair: Option<String> = None;

    for (label, source) in attributes {
        let value = match source {
            ClueSource::Field(key) => {
                pair = Some((*key).to_string());
                student.attribute(key).unwrap_or_default()
            }
            ClueSource::Equipment => {
                let slots = [
                    student.equipment_1.as_str(),
                    student.equipment_2.as_str(),
                    student.equipment_3.as_str(),
                ];
                slots
                    .iter()
                    .filter(|slot| !slot.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };

        drafts.push(ClueDraft {
            label,
            value,
            difficulty,
            field: Some((*label).to_string()),
            pair: pair.clone(),
        });
    }

    drafts
}

/// Log which clues an identity has had revealed, given its attempt count.
///
/// No-op for non-hard rounds. The always-visible image clue (order 0) is
/// skipped; every other clue whose threshold the attempt number has reached
/// gets an upsert-once usage row. Duplicate writes are absorbed silently.
///
/// # Errors
///
/// Propagates [`StoreError`] from the backend.
pub fn log_clue_usage(
    clue_store: &dyn ClueStore,
    usage_store: &dyn ClueUsageStore,
    round: &Round,
    attempt_number: u32,
    identity: &Identity,
) -> Result<(), GameError> {
    if round.mode != GameMode::Hard {
        return Ok(());
    }

    for clue in clue_store.clues_for_round(round.id)? {
        if clue.display_order == 0 {
            continue;
        }
        let Some(threshold) = threshold_for_order(clue.display_order) else {
            continue;
        };
        if attempt_number < threshold {
            continue;
        }

        let clue_key = clue
            .pair
            .clone()
            .or_else(|| clue.field.clone())
            .unwrap_or_else(|| clue.label.clone());
        let usage = ClueUsage {
            clue_id: clue.id,
            round_id: round.id,
            display_order: clue.display_order,
            clue_key,
            label: clue.label.clone(),
            difficulty: clue.difficulty,
            player_identifier: identity.tag(),
            player_type: identity.player_type().to_string(),
            user_id: identity.user_id(),
            guest_token: identity.guest_token().map(str::to_string),
            attempt_number,
        };
        match usage_store.insert_clue_usage(usage) {
            Ok(()) | Err(StoreError::Conflict(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn clue_cache_key(round_id: RoundId) -> String {
    format!("hard_mode_clues:{round_id}")
}

/// Configured TTL if set, otherwise seconds until the end of the current day
/// (minimum 60s) so clues expire at midnight by default.
fn clue_cache_ttl(config: &GameConfig, clock: &dyn Clock) -> u64 {
    if config.clue_cache_ttl_seconds > 0 {
        return config.clue_cache_ttl_seconds;
    }

    let now = clock.now();
    let next_midnight = clock
        .today()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());
    let remaining = next_midnight.map_or(60, |midnight| (midnight - now).num_seconds());
    u64::try_from(remaining.max(60)).unwrap_or(60)
}
