//! Statistics acceptance over multi-day play: streaks, percentiles, caching.
use archedle_game::{
    FixedClock, GameConfig, GameEngine, GameMode, Identity, MemoryCache, MemoryStore, NoCache,
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
        release_date_gl: None,
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

/// Complete the classic round of `day` for `identity`, missing `misses` times
/// before hitting the target.
fn complete_day(store: &MemoryStore, identity: &Identity, day: &str, misses: usize) {
    let clock = FixedClock::at(day.parse().unwrap());
    let engine = GameEngine::new(store, &NoCache, &clock, GameConfig::default());
    let target = engine.daily_student(GameMode::Classic).expect("target");

    let wrong: Vec<Student> = catalog()
        .into_iter()
        .filter(|s| s.id != target.id)
        .collect();
    for miss in wrong.iter().take(misses) {
        engine
            .submit_guess(identity, GameMode::Classic, &miss.first_name)
            .expect("recorded");
    }
    engine
        .submit_guess(identity, GameMode::Classic, &target.first_name)
        .expect("recorded");
}

#[test]
fn streaks_track_consecutive_play_days() {
    let store = MemoryStore::new(catalog());
    let user = Identity::User(1);

    for day in ["2025-01-01", "2025-01-02", "2025-01-03", "2025-01-05"] {
        complete_day(&store, &user, day, 0);
    }

    let clock = FixedClock::at("2025-01-05".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());
    let snapshot = engine.statistics(Some(1), None).unwrap();

    assert_eq!(snapshot.best_daily_streak, Some(3));
    // Jan 4 was skipped, so the walk back from Jan 5 stops at one day.
    assert_eq!(snapshot.current_daily_streak, Some(1));

    // Guests carry no streaks.
    let guest_view = engine.statistics(None, None).unwrap();
    assert_eq!(guest_view.best_daily_streak, None);
    assert_eq!(guest_view.current_daily_streak, None);
}

#[test]
fn percentile_rewards_lower_averages() {
    let store = MemoryStore::new(catalog());
    let sharp = Identity::User(1);
    let slow = Identity::User(2);

    complete_day(&store, &sharp, "2025-01-01", 0); // average 1.0
    complete_day(&store, &slow, "2025-01-01", 2); // average 3.0

    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());

    let sharp_view = engine.statistics(Some(1), None).unwrap();
    let sharp_pct = sharp_view.user_percentile.expect("percentile");
    assert!((sharp_pct.average_attempts - 1.0).abs() < f64::EPSILON);
    // Everyone averages at or above 1.0.
    assert!((sharp_pct.percentile - 100.0).abs() < f64::EPSILON);
    assert_eq!(sharp_pct.total_players, 2);

    let slow_view = engine.statistics(Some(2), None).unwrap();
    let slow_pct = slow_view.user_percentile.expect("percentile");
    assert!((slow_pct.percentile - 50.0).abs() < f64::EPSILON);

    // A user with no completed runs has no percentile.
    let outsider_view = engine.statistics(Some(99), None).unwrap();
    assert!(outsider_view.user_percentile.is_none());
}

#[test]
fn averages_and_mode_blocks_fold_all_runs() {
    let store = MemoryStore::new(catalog());
    complete_day(&store, &Identity::User(1), "2025-01-01", 0); // 1 attempt
    complete_day(&store, &Identity::User(2), "2025-01-01", 2); // 3 attempts
    complete_day(&store, &Identity::Guest("T1".to_string()), "2025-01-01", 1); // 2 attempts

    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());
    let snapshot = engine.statistics(Some(1), None).unwrap();

    // (1 + 3 + 2) / 3 runs
    assert!((snapshot.average_guess_per_student - 2.0).abs() < f64::EPSILON);
    // Registered users only: (1 + 3) / 2
    assert!((snapshot.average_guess_per_registered_user - 2.0).abs() < f64::EPSILON);
    assert_eq!(snapshot.average_guess_current_user, Some(1.0));

    let classic = snapshot.modes.get("classic").expect("classic block");
    assert_eq!(classic.runs, 3);
    assert!((classic.average_attempts - 2.0).abs() < f64::EPSILON);
    assert_eq!(classic.total_guesses, 6);
    assert_eq!(classic.user_guesses, 4);
    assert_eq!(classic.guest_guesses, 2);
    assert_eq!(classic.today_guesses, 6);
    assert_eq!(classic.today_correct, 3);

    // Hard mode saw no play; its block is all zeroes.
    let hard = snapshot.modes.get("hard").expect("hard block");
    assert_eq!(hard.runs, 0);
    assert!((hard.average_attempts - 0.0).abs() < f64::EPSILON);
}

#[test]
fn hint_bands_cover_hard_mode_runs_only() {
    let store = MemoryStore::new(catalog());
    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let engine = GameEngine::new(&store, &NoCache, &clock, GameConfig::default());
    let guest = Identity::Guest("T1".to_string());

    // Complete hard mode in 2 attempts: lands in the first band.
    let target = engine.daily_student(GameMode::Hard).expect("target");
    let wrong = catalog()
        .into_iter()
        .find(|s| s.id != target.id)
        .expect("a non-target student");
    engine
        .submit_guess(&guest, GameMode::Hard, &wrong.first_name)
        .unwrap();
    engine
        .submit_guess(&guest, GameMode::Hard, &target.first_name)
        .unwrap();

    let snapshot = engine.statistics(None, None).unwrap();
    let bands = &snapshot.hard_mode_hint_success_rates;
    assert_eq!(bands.len(), 3);
    let early = bands.get("no_extra_hints").expect("first band");
    assert_eq!(early.label, "Solved before extra hints");
    assert_eq!(early.count, 1);
    assert!((early.rate - 100.0).abs() < f64::EPSILON);
}

#[test]
fn snapshots_are_cached_per_day_when_enabled() {
    let store = MemoryStore::new(catalog());
    let cache = MemoryCache::new();
    let clock = FixedClock::at("2025-01-01".parse().unwrap());
    let config = GameConfig {
        statistics_cache_ttl_seconds: 300,
        ..GameConfig::default()
    };
    let engine = GameEngine::new(&store, &cache, &clock, config);
    let guest = Identity::Guest("T1".to_string());

    let before = engine.statistics(None, None).unwrap();
    assert_eq!(before.total_guesses, 0);

    engine
        .submit_guess(&guest, GameMode::Classic, "Yuuka")
        .unwrap();

    // The stale snapshot is served until the cache entry expires.
    let cached = engine.statistics(None, None).unwrap();
    assert_eq!(cached.total_guesses, 0);

    // A different scope misses the cache and sees the new guess.
    let fresh = engine.statistics(Some(1), None).unwrap();
    assert_eq!(fresh.total_guesses, 1);
}
