use chrono::NaiveDate;

use fixturecast::elo::RatingEngine;
use fixturecast::error::PredictError;
use fixturecast::record::MatchRecord;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date should parse")
}

fn finished(date: &str, home: &str, away: &str, hg: u32, ag: u32) -> MatchRecord {
    MatchRecord {
        date: day(date),
        competition: "PL".to_string(),
        season: 2025,
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_goals: Some(hg),
        away_goals: Some(ag),
    }
}

fn scheduled(date: &str, home: &str, away: &str) -> MatchRecord {
    MatchRecord {
        home_goals: None,
        away_goals: None,
        ..finished(date, home, away, 0, 0)
    }
}

fn sample_history() -> Vec<MatchRecord> {
    vec![
        finished("2025-08-09", "Arsenal", "Chelsea", 2, 0),
        finished("2025-08-10", "Liverpool", "Everton", 1, 1),
        finished("2025-08-16", "Chelsea", "Liverpool", 0, 3),
        finished("2025-08-17", "Everton", "Arsenal", 1, 2),
        finished("2025-08-23", "Arsenal", "Liverpool", 0, 0),
        finished("2025-08-24", "Chelsea", "Everton", 4, 1),
    ]
}

#[test]
fn replay_equals_applying_one_by_one() {
    let history = sample_history();

    let mut replayed = RatingEngine::new(1500.0, 20.0);
    replayed.replay(&history).expect("replay should succeed");

    let mut folded = RatingEngine::new(1500.0, 20.0);
    for m in &history {
        folded.apply(m).expect("apply should succeed");
    }

    let a = replayed.snapshot();
    let b = folded.snapshot();
    assert_eq!(a.len(), b.len());
    for (team, rating) in a.iter() {
        assert_eq!(Some(rating), b.rating(team), "rating diverged for {team}");
    }
}

#[test]
fn a_single_update_is_zero_sum() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    engine.apply(&finished("2025-08-09", "Leeds", "Fulham", 3, 1)).unwrap();
    engine.apply(&finished("2025-08-16", "Fulham", "Leeds", 2, 2)).unwrap();

    let delta = engine
        .apply(&finished("2025-08-23", "Leeds", "Fulham", 0, 1))
        .unwrap();

    let total = engine.team("Leeds").unwrap().rating + engine.team("Fulham").unwrap().rating;
    assert!((total - 3000.0).abs() < 1e-9, "rating mass must be conserved");
    assert!(delta.home_change < 0.0, "a home loss must cost the home side");
}

#[test]
fn home_win_from_even_ratings_moves_both_sides_by_k_over_two() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    let delta = engine
        .apply(&finished("2025-08-09", "Arsenal", "Chelsea", 2, 0))
        .unwrap();

    assert!((delta.expected_home - 0.5).abs() < 1e-12);
    assert!((delta.home_change - 10.0).abs() < 1e-9);
    assert!((engine.team("Arsenal").unwrap().rating - 1510.0).abs() < 1e-9);
    assert!((engine.team("Chelsea").unwrap().rating - 1490.0).abs() < 1e-9);
    assert_eq!(engine.team("Arsenal").unwrap().matches_played, 1);
    assert_eq!(engine.team("Chelsea").unwrap().matches_played, 1);
}

#[test]
fn snapshot_is_stable_without_updates() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    engine.replay(&sample_history()).unwrap();

    let first = engine.snapshot();
    let second = engine.snapshot();
    assert_eq!(first.len(), second.len());
    for (team, rating) in first.iter() {
        assert_eq!(Some(rating), second.rating(team));
    }
}

#[test]
fn replay_rejects_a_future_fixture_without_touching_ratings() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    engine.initialize(["Arsenal", "Chelsea", "Liverpool", "Everton"]);
    let before = engine.snapshot();

    let mut history = sample_history();
    history.insert(3, scheduled("2025-08-17", "Arsenal", "Liverpool"));

    let err = engine.replay(&history).unwrap_err();
    assert!(matches!(err, PredictError::InvalidInput(_)));

    let after = engine.snapshot();
    assert_eq!(before.len(), after.len());
    for (team, rating) in before.iter() {
        assert_eq!(Some(rating), after.rating(team), "{team} moved on a failed replay");
    }
    assert_eq!(engine.team("Arsenal").unwrap().matches_played, 0);
}

#[test]
fn replay_rejects_date_regressions() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    let history = vec![
        finished("2025-08-16", "Arsenal", "Chelsea", 1, 0),
        finished("2025-08-09", "Chelsea", "Arsenal", 2, 2),
    ];
    let err = engine.replay(&history).unwrap_err();
    assert!(matches!(err, PredictError::InvalidInput(_)));
    assert!(engine.is_empty());
}

#[test]
fn replay_accepts_same_day_matches() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    let history = vec![
        finished("2025-08-09", "Arsenal", "Chelsea", 1, 0),
        finished("2025-08-09", "Liverpool", "Everton", 0, 2),
    ];
    assert_eq!(engine.replay(&history).unwrap(), 2);
}

#[test]
fn apply_requires_a_final_score() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    let err = engine
        .apply(&scheduled("2025-09-01", "Arsenal", "Chelsea"))
        .unwrap_err();
    assert!(matches!(err, PredictError::InvalidInput(_)));
    assert!(engine.is_empty());
}

#[test]
fn apply_rejects_a_team_playing_itself() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    let err = engine
        .apply(&finished("2025-09-01", "Arsenal", "Arsenal", 1, 0))
        .unwrap_err();
    assert!(matches!(err, PredictError::InvalidInput(_)));
}

#[test]
fn teams_appear_lazily_at_the_baseline() {
    let mut engine = RatingEngine::new(1400.0, 20.0);
    assert!(engine.is_empty());
    engine
        .apply(&finished("2025-08-09", "Brentford", "Wolves", 1, 1))
        .unwrap();
    // A draw between unseen teams leaves both at the baseline.
    assert!((engine.team("Brentford").unwrap().rating - 1400.0).abs() < 1e-12);
    assert!((engine.team("Wolves").unwrap().rating - 1400.0).abs() < 1e-12);
}

#[test]
fn initialize_never_resets_a_seen_team() {
    let mut engine = RatingEngine::new(1500.0, 20.0);
    engine
        .apply(&finished("2025-08-09", "Arsenal", "Chelsea", 2, 0))
        .unwrap();
    let before = engine.team("Arsenal").unwrap().rating;

    engine.initialize(["Arsenal", "Newcastle"]);
    assert_eq!(engine.team("Arsenal").unwrap().rating, before);
    assert_eq!(engine.team("Newcastle").unwrap().rating, 1500.0);
}
