use chrono::NaiveDate;

use fixturecast::elo::RatingEngine;
use fixturecast::record::MatchRecord;
use fixturecast::store::{
    load_finished_matches, load_ratings, load_upcoming_fixtures, open_db, save_ratings,
    upsert_matches,
};

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date should parse")
}

fn record(date: &str, home: &str, away: &str, score: Option<(u32, u32)>) -> MatchRecord {
    MatchRecord {
        date: day(date),
        competition: "PL".to_string(),
        season: 2025,
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_goals: score.map(|(h, _)| h),
        away_goals: score.map(|(_, a)| a),
    }
}

fn temp_conn() -> (tempfile::TempDir, rusqlite::Connection) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let conn = open_db(&dir.path().join("matches.sqlite")).expect("open db");
    (dir, conn)
}

#[test]
fn finished_matches_come_back_oldest_first() {
    let (_dir, mut conn) = temp_conn();
    upsert_matches(
        &mut conn,
        &[
            record("2025-08-23", "Arsenal", "Liverpool", Some((0, 0))),
            record("2025-08-09", "Arsenal", "Chelsea", Some((2, 0))),
            record("2025-09-13", "Chelsea", "Arsenal", None),
            record("2025-08-16", "Chelsea", "Liverpool", Some((0, 3))),
        ],
    )
    .unwrap();

    let finished = load_finished_matches(&conn, None).unwrap();
    let dates: Vec<String> = finished.iter().map(|m| m.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-08-09", "2025-08-16", "2025-08-23"]);

    let upcoming = load_upcoming_fixtures(&conn, None).unwrap();
    assert_eq!(upcoming.len(), 1);
    assert!(!upcoming[0].is_completed());
}

#[test]
fn reingesting_a_row_updates_instead_of_duplicating() {
    let (_dir, mut conn) = temp_conn();
    // First pass: the fixture is still scheduled.
    upsert_matches(
        &mut conn,
        &[record("2025-08-09", "Arsenal", "Chelsea", None)],
    )
    .unwrap();
    assert_eq!(load_upcoming_fixtures(&conn, None).unwrap().len(), 1);

    // Second pass: the result has been recorded upstream.
    upsert_matches(
        &mut conn,
        &[record("2025-08-09", "Arsenal", "Chelsea", Some((2, 0)))],
    )
    .unwrap();

    assert!(load_upcoming_fixtures(&conn, None).unwrap().is_empty());
    let finished = load_finished_matches(&conn, None).unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].score(), Some((2, 0)));
}

#[test]
fn competition_filter_narrows_both_queries() {
    let (_dir, mut conn) = temp_conn();
    let mut la_liga = record("2025-08-09", "Barcelona", "Sevilla", Some((3, 1)));
    la_liga.competition = "PD".to_string();
    upsert_matches(
        &mut conn,
        &[
            record("2025-08-09", "Arsenal", "Chelsea", Some((2, 0))),
            la_liga,
        ],
    )
    .unwrap();

    let pl_only = load_finished_matches(&conn, Some("PL")).unwrap();
    assert_eq!(pl_only.len(), 1);
    assert_eq!(pl_only[0].home_team, "Arsenal");
}

#[test]
fn ratings_survive_a_round_trip() {
    let (_dir, mut conn) = temp_conn();
    let mut engine = RatingEngine::new(1500.0, 20.0);
    engine
        .replay(&[
            record("2025-08-09", "Arsenal", "Chelsea", Some((2, 0))),
            record("2025-08-16", "Chelsea", "Arsenal", Some((1, 1))),
        ])
        .unwrap();

    let written = save_ratings(&mut conn, engine.ratings()).unwrap();
    assert_eq!(written, 2);

    let mut restored = RatingEngine::new(1500.0, 20.0);
    for (team, state) in load_ratings(&conn).unwrap() {
        restored.seed(&team, state.rating, state.matches_played);
    }

    for (team, state) in engine.ratings() {
        let got = restored.team(team).expect("team should be restored");
        assert_eq!(got.rating, state.rating);
        assert_eq!(got.matches_played, state.matches_played);
    }
}

#[test]
fn saving_ratings_twice_overwrites_in_place() {
    let (_dir, mut conn) = temp_conn();
    let mut engine = RatingEngine::new(1500.0, 20.0);
    engine
        .apply(&record("2025-08-09", "Arsenal", "Chelsea", Some((2, 0))))
        .unwrap();
    save_ratings(&mut conn, engine.ratings()).unwrap();

    engine
        .apply(&record("2025-08-16", "Chelsea", "Arsenal", Some((2, 0))))
        .unwrap();
    save_ratings(&mut conn, engine.ratings()).unwrap();

    let rows = load_ratings(&conn).unwrap();
    assert_eq!(rows.len(), 2);
    for (team, state) in rows {
        assert_eq!(state.matches_played, 2, "{team} should show two matches");
    }
}
