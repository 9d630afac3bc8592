use std::path::PathBuf;

use fixturecast::config::ModelConfig;
use fixturecast::elo::RatingEngine;
use fixturecast::predict;
use fixturecast::store;

// This binary is intentionally simple: it replays whatever history the
// store holds and prints predictions for the stored fixtures. It avoids
// network calls and is meant for quick model tuning from the shell.
fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env");
    let cfg = ModelConfig::from_env();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(store::default_db_path)
        .ok_or_else(|| anyhow::anyhow!("no database path"))?;
    let conn = store::open_db(&path)?;

    let history = store::load_finished_matches(&conn, None)?;
    let mut engine = RatingEngine::from_config(&cfg);
    let applied = engine.replay(&history)?;
    println!("Replayed {applied} matches; {} teams rated", engine.len());

    let snapshot = engine.snapshot();
    let fixtures = store::load_upcoming_fixtures(&conn, None)?;
    if fixtures.is_empty() {
        println!("No scheduled fixtures in {}", path.display());
        return Ok(());
    }

    for fixture in &fixtures {
        match predict::predict(fixture, &snapshot, &cfg) {
            Ok(p) => {
                let top = p
                    .top_scorelines
                    .first()
                    .map(|s| format!("{}-{}", s.home_goals, s.away_goals))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} {}  H {:.1}% D {:.1}% A {:.1}%  xG {:.2}-{:.2}  top {top}",
                    p.date,
                    p.label(),
                    p.home_win_prob * 100.0,
                    p.draw_prob * 100.0,
                    p.away_win_prob * 100.0,
                    p.expected_home_goals,
                    p.expected_away_goals,
                );
            }
            Err(err) => println!("{}: skipped ({err})", fixture.label()),
        }
    }
    Ok(())
}
