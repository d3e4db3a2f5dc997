//! Guess resolution and field-by-field scoring.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogStore, Student};

/// How the guessed student's height relates to the target's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightStatus {
    Correct,
    Above,
    Below,
}

/// Per-field equality map between the guessed and target student.
///
/// Fixed shape with one boolean per comparable column; serialized through
/// serde as the single encode/decode boundary so the wire payload keeps the
/// historical key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldMatches {
    pub first_name: bool,
    pub second_name: bool,
    pub image: bool,
    pub age: bool,
    pub birthday: bool,
    pub height: bool,
    pub release_date_gl: bool,
    pub school: bool,
    pub club: bool,
    pub role: bool,
    pub position: bool,
    pub class: bool,
    pub damage_type: bool,
    pub armor_type: bool,
    pub weapon_type: bool,
    pub unique_equipment_name: bool,
    pub unique_equipment_img: bool,
    pub memorial_lobby: bool,
    pub equipment_1: bool,
    pub equipment_2: bool,
    pub equipment_3: bool,
}

/// Outcome of scoring a resolved guess against the daily target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// True iff the guessed student is the target.
    pub is_match: bool,
    pub fields: FieldMatches,
    #[serde(rename = "heightStatus")]
    pub height_status: HeightStatus,
}

/// Resolve a free-text guess to a catalog student.
///
/// Case-insensitive and whitespace-trimmed. Clauses, in order: the two input
/// tokens as (first, second) or (second, first), then the full string against
/// either name field alone. The first catalog row satisfying any clause wins.
#[must_use]
pub fn find_guessed_student(catalog: &dyn CatalogStore, guess: &str) -> Option<Student> {
    let clean = guess.trim().to_lowercase();
    if clean.is_empty() {
        return None;
    }
    let mut tokens = clean.split_whitespace();
    let head = tokens.next().unwrap_or_default();
    let tail = tokens.next().unwrap_or_default();

    catalog.all_students().into_iter().find(|student| {
        let first = student.first_name.to_lowercase();
        let second = student.second_name.to_lowercase();
        (first == head && second == tail)
            || (first == tail && second == head)
            || first == clean
            || second == clean
    })
}

/// Score a resolved guess against the target student.
#[must_use]
pub fn score_guess(guessed: &Student, target: &Student) -> MatchResult {
    let fields = FieldMatches {
        first_name: guessed.first_name == target.first_name,
        second_name: guessed.second_name == target.second_name,
        image: guessed.image == target.image,
        age: guessed.age == target.age,
        birthday: guessed.birthday == target.birthday,
        height: guessed.height == target.height,
        release_date_gl: guessed.release_date_gl == target.release_date_gl,
        school: guessed.school == target.school,
        club: guessed.club == target.club,
        role: guessed.role == target.role,
        position: guessed.position == target.position,
        class: guessed.class == target.class,
        damage_type: guessed.damage_type == target.damage_type,
        armor_type: guessed.armor_type == target.armor_type,
        weapon_type: guessed.weapon_type == target.weapon_type,
        unique_equipment_name: guessed.unique_equipment_name == target.unique_equipment_name,
        unique_equipment_img: guessed.unique_equipment_img == target.unique_equipment_img,
        memorial_lobby: guessed.memorial_lobby == target.memorial_lobby,
        equipment_1: guessed.equipment_1 == target.equipment_1,
        equipment_2: guessed.equipment_2 == target.equipment_2,
        equipment_3: guessed.equipment_3 == target.equipment_3,
    };

    let height_status = match compare_heights(&guessed.height, &target.height) {
        Ordering::Equal => HeightStatus::Correct,
        Ordering::Greater => HeightStatus::Above,
        Ordering::Less => HeightStatus::Below,
    };

    MatchResult {
        is_match: guessed.id == target.id,
        fields,
        height_status,
    }
}

/// Heights compare numerically when both sides parse as numbers, otherwise
/// byte-wise as stored (heights like `150cm` share a suffix, so byte order
/// tracks the number).
fn compare_heights(guessed: &str, target: &str) -> Ordering {
    if guessed == target {
        return Ordering::Equal;
    }
    match (guessed.trim().parse::<f64>(), target.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => guessed.cmp(target),
    }
}
