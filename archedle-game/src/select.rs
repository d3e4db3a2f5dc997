//! Deterministic daily target selection.
use chrono::NaiveDate;

use crate::catalog::{CatalogStore, StudentId};
use crate::error::GameError;
use crate::modes::GameMode;

/// Select today's target student id for a mode.
///
/// The selection hashes the ISO date string concatenated with the lowercase
/// mode key (CRC32, for compatibility with the historical round data) and
/// reduces it modulo the catalog size to an offset in ascending-id order.
/// Pure pseudo-randomness: the same `(date, mode, catalog)` always yields the
/// same id, and the mode key in the seed decorrelates modes on the same day.
///
/// # Errors
///
/// Returns [`GameError::EmptyCatalog`] when the catalog has no rows; selection
/// without seed data is a fatal configuration error.
pub fn select_daily_student_id(
    date: NaiveDate,
    mode: GameMode,
    catalog: &dyn CatalogStore,
) -> Result<StudentId, GameError> {
    let total = catalog.student_count();
    if total == 0 {
        return Err(GameError::EmptyCatalog);
    }

    let seed = format!("{}{}", date.format("%Y-%m-%d"), mode.key());
    let hash = crc32fast::hash(seed.as_bytes());
    let offset = hash as usize % total;

    if let Some(id) = catalog.student_id_at(offset) {
        return Ok(id);
    }

    // Offset raced past the catalog edge; fall back to the first row.
    log::warn!("no student at offset {offset} for seed {seed}, falling back to first");
    catalog.first_student_id().ok_or(GameError::EmptyCatalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::student;
    use crate::store::MemoryStore;

    fn catalog(n: u32) -> MemoryStore {
        MemoryStore::new((1..=n).map(|i| student(i, "First", "Second")).collect())
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("valid date")
    }

    #[test]
    fn selection_is_deterministic() {
        let store = catalog(5);
        let a = select_daily_student_id(date("2025-01-01"), GameMode::Classic, &store).unwrap();
        let b = select_daily_student_id(date("2025-01-01"), GameMode::Classic, &store).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn selection_matches_crc32_offset() {
        let store = catalog(5);
        let expected_offset = crc32fast::hash(b"2025-01-01classic") as usize % 5;
        let id = select_daily_student_id(date("2025-01-01"), GameMode::Classic, &store).unwrap();
        assert_eq!(id, store.student_id_at(expected_offset).unwrap());
    }

    #[test]
    fn modes_use_distinct_seeds() {
        let store = catalog(500);
        let day = date("2025-01-01");
        let classic = select_daily_student_id(day, GameMode::Classic, &store).unwrap();
        let hard = select_daily_student_id(day, GameMode::Hard, &store).unwrap();
        let image = select_daily_student_id(day, GameMode::Image, &store).unwrap();
        // Not guaranteed distinct in general, but fixed here by the chosen date.
        assert!(classic != hard || hard != image);
    }

    #[test]
    fn empty_catalog_is_fatal() {
        let store = MemoryStore::new(Vec::new());
        assert_eq!(
            select_daily_student_id(date("2025-01-01"), GameMode::Classic, &store),
            Err(GameError::EmptyCatalog)
        );
    }
}
