//! End-to-end daily gameplay: round creation, guessing, history, statistics.
use archedle_game::{
    FixedClock, GameConfig, GameEngine, GameMode, GuessOutcome, Identity, MemoryStore, NoCache,
    Student,
};

fn student(id: u32, first: &str, second: &str) -> Student {
    Student {
        id,
        first_name: first.to_string(),
        second_name: second.to_string(),
        age: 16,
        birthday: "January 1".to_string(),
        height: "150cm".to_string(),
        designer: "D".to_string(),
        illustrator: "I".to_string(),
        voice: "V".to_string(),
        release_date_jp: None,
        release_date_gl: Some("2021-02-04".to_string()),
        school: "Abydos".to_string(),
        club: "Countermeasures".to_string(),
        role: "Attacker".to_string(),
        position: "Front".to_string(),
        class: "Striker".to_string(),
        damage_type: "Explosive".to_string(),
        armor_type: "Light".to_string(),
        weapon_type: "AR".to_string(),
        equipment_1: "Hat".to_string(),
        equipment_2: "Bag".to_string(),
        equipment_3: "Shoes".to_string(),
        unique_equipment_name: "Goggles".to_string(),
        unique_equipment_img: "ue.png".to_string(),
        memorial_lobby: None,
        image: format!("students/{id}.png"),
    }
}

fn catalog() -> Vec<Student> {
    vec![
        student(1, "Yuuka", "Hayase"),
        student(2, "Hoshino", "Takanashi"),
        student(3, "Aru", "Rikuhachima"),
        student(4, "Shiroko", "Sunaookami"),
        student(5, "Hina", "Sorasaki"),
    ]
}

#[test]
fn guest_plays_a_classic_round_to_completion() {
    let store = MemoryStore::new(catalog());
    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());
    let guest = Identity::Guest("T1".to_string());

    let target = engine.daily_student(GameMode::Classic).expect("target");
    let wrong = catalog()
        .into_iter()
        .find(|s| s.id != target.id)
        .expect("a non-target student");

    // Miss first.
    let miss = engine
        .submit_guess(&guest, GameMode::Classic, &wrong.first_name)
        .expect("recorded");
    match miss {
        GuessOutcome::Recorded {
            correct, attempts, ..
        } => {
            assert!(!correct);
            assert_eq!(attempts, 1);
        }
        other => panic!("expected a recorded miss, got {other:?}"),
    }
    assert!(!engine.has_completed(&guest, GameMode::Classic).unwrap());

    // Then hit.
    let hit = engine
        .submit_guess(&guest, GameMode::Classic, &target.first_name)
        .expect("recorded");
    match hit {
        GuessOutcome::Recorded {
            correct,
            attempts,
            result,
        } => {
            assert!(correct);
            assert_eq!(attempts, 2);
            assert!(result.is_match);
            assert!(result.fields.first_name);
        }
        other => panic!("expected a recorded hit, got {other:?}"),
    }
    assert!(engine.has_completed(&guest, GameMode::Classic).unwrap());
    assert_eq!(engine.attempt_count(&guest, GameMode::Classic).unwrap(), 2);

    // Completed rounds accept no further guesses.
    assert_eq!(
        engine
            .submit_guess(&guest, GameMode::Classic, &wrong.first_name)
            .unwrap(),
        GuessOutcome::AlreadyCompleted
    );

    // History is attempt-ordered and enriched.
    let history = engine.history(&guest, GameMode::Classic).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].student.as_ref().unwrap().id, wrong.id);
    assert!(!history[0].correct);
    assert_eq!(history[1].student.as_ref().unwrap().id, target.id);
    assert!(history[1].correct);

    let latest = engine.latest_guess(&guest).unwrap().expect("latest guess");
    assert!(latest.correct);

    // The day's activity is visible in the snapshot.
    let snapshot = engine.statistics(None, None).unwrap();
    assert_eq!(snapshot.total_guesses, 2);
    assert_eq!(snapshot.today_guesses, 2);
    assert_eq!(snapshot.today_correct_guesses, 1);
    assert_eq!(
        snapshot.today_correct_guesses_by_mode.get("classic").copied(),
        Some(1)
    );
}

#[test]
fn selector_offset_and_reversed_name_complete_the_day() {
    let store = MemoryStore::new(catalog());
    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());
    let guest = Identity::Guest("T1".to_string());

    // The classic target is the catalog row at the hashed date+mode offset.
    let expected_offset = crc32fast::hash(b"2025-01-01classic") as usize % 5;
    let target = engine.daily_student(GameMode::Classic).expect("target");
    assert_eq!(target.id, catalog()[expected_offset].id);

    let wrong = catalog()
        .into_iter()
        .find(|s| s.id != target.id)
        .expect("a non-target student");
    engine
        .submit_guess(&guest, GameMode::Classic, &wrong.first_name)
        .expect("recorded");

    // Second name first still resolves; the hit lands on attempt 2.
    let reversed = format!("{} {}", target.second_name, target.first_name);
    let outcome = engine
        .submit_guess(&guest, GameMode::Classic, &reversed)
        .expect("recorded");
    assert!(matches!(
        outcome,
        GuessOutcome::Recorded {
            correct: true,
            attempts: 2,
            ..
        }
    ));
    assert!(engine.has_completed(&guest, GameMode::Classic).unwrap());
    assert_eq!(engine.attempt_count(&guest, GameMode::Classic).unwrap(), 2);

    let snapshot = engine.statistics(None, None).unwrap();
    assert!(snapshot.today_correct_guesses >= 1);
}

#[test]
fn modes_progress_independently() {
    let store = MemoryStore::new(catalog());
    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());
    let guest = Identity::Guest("T1".to_string());

    let target = engine.daily_student(GameMode::Classic).expect("target");
    engine
        .submit_guess(&guest, GameMode::Classic, &target.first_name)
        .unwrap();

    assert!(engine.has_completed(&guest, GameMode::Classic).unwrap());
    assert!(!engine.has_completed(&guest, GameMode::Hard).unwrap());
    assert_eq!(engine.attempt_count(&guest, GameMode::Hard).unwrap(), 0);
}

#[test]
fn users_and_guests_keep_separate_ledgers() {
    let store = MemoryStore::new(catalog());
    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());

    let guest = Identity::Guest("T1".to_string());
    let user = Identity::User(42);
    let target = engine.daily_student(GameMode::Classic).expect("target");

    engine
        .submit_guess(&guest, GameMode::Classic, &target.first_name)
        .unwrap();
    assert!(engine.has_completed(&guest, GameMode::Classic).unwrap());
    assert!(!engine.has_completed(&user, GameMode::Classic).unwrap());

    let snapshot = engine.statistics(Some(42), None).unwrap();
    assert_eq!(snapshot.total_guesses_current_user, Some(0));
    assert_eq!(snapshot.total_guesses, 1);
}

#[test]
fn snapshot_serializes_with_camel_case_keys() {
    let store = MemoryStore::new(catalog());
    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());

    let snapshot = engine.statistics(None, None).unwrap();
    let json = serde_json::to_value(&snapshot).expect("serializes");
    assert!(json.get("totalGuesses").is_some());
    assert!(json.get("todayGuessesByMode").is_some());
    assert!(json.get("hardModeHintSuccessRates").is_some());
    assert!(json.get("total_guesses").is_none());
}
