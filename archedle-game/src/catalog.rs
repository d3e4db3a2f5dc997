//! Student catalog: immutable reference data loaded once at startup.
use serde::{Deserialize, Serialize};

/// Identifier of a catalog student.
pub type StudentId = u32;

/// A single student record. Created at data-load time, never mutated by
/// gameplay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub second_name: String,
    pub age: u8,
    pub birthday: String,
    pub height: String,
    pub designer: String,
    pub illustrator: String,
    pub voice: String,
    #[serde(default)]
    pub release_date_jp: Option<String>,
    #[serde(default)]
    pub release_date_gl: Option<String>,
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
    #[serde(default)]
    pub memorial_lobby: Option<String>,
    pub image: String,
}

impl Student {
    /// Scalar attribute lookup by column key, as exposed through clues.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<String> {
        let value = match key {
            "first_name" => self.first_name.clone(),
            "second_name" => self.second_name.clone(),
            "age" => self.age.to_string(),
            "birthday" => self.birthday.clone(),
            "height" => self.height.clone(),
            "school" => self.school.clone(),
            "club" => self.club.clone(),
            "role" => self.role.clone(),
            "position" => self.position.clone(),
            "class" => self.class.clone(),
            "damage_type" => self.damage_type.clone(),
            "armor_type" => self.armor_type.clone(),
            "weapon_type" => self.weapon_type.clone(),
            "equipment_1" => self.equipment_1.clone(),
            "equipment_2" => self.equipment_2.clone(),
            "equipment_3" => self.equipment_3.clone(),
            "unique_equipment_name" => self.unique_equipment_name.clone(),
            "unique_equipment_img" => self.unique_equipment_img.clone(),
            "memorial_lobby" => self.memorial_lobby.clone().unwrap_or_default(),
            "image" => self.image.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Compact projection used by search results and statistics payloads.
    #[must_use]
    pub fn summary(&self) -> StudentSummary {
        StudentSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            second_name: self.second_name.clone(),
            image: self.image.clone(),
        }
    }
}

/// Minimal student projection (id, names, image).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: StudentId,
    pub first_name: String,
    pub second_name: String,
    pub image: String,
}

/// Search-result projection: id and names only. Search must not leak asset
/// paths for students the player has yet to guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub id: StudentId,
    pub first_name: String,
    pub second_name: String,
}

impl From<Student> for SearchCandidate {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            first_name: student.first_name,
            second_name: student.second_name,
        }
    }
}

/// Read-only access to the student catalog.
///
/// The catalog is reference data: lookups are infallible and ordering is
/// stable (ascending id). Store-backed implementations may push the scan in
/// [`CatalogStore::all_students`] down into indexed queries.
pub trait CatalogStore {
    /// Number of students in the catalog.
    fn student_count(&self) -> usize;

    /// Student id at the given offset in ascending-id order.
    fn student_id_at(&self, offset: usize) -> Option<StudentId>;

    /// First student id in ascending-id order.
    fn first_student_id(&self) -> Option<StudentId>;

    /// Full record for a student id.
    fn student_by_id(&self, id: StudentId) -> Option<Student>;

    /// Every student in catalog natural order.
    fn all_students(&self) -> Vec<Student>;
}
