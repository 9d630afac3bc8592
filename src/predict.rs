use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::config::ModelConfig;
use crate::elo::RatingSnapshot;
use crate::error::{PredictError, Result};
use crate::goal_model::{self, ScorelineProb};
use crate::record::MatchRecord;

/// Full model output for one fixture. Derived on demand, never persisted.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub date: NaiveDate,
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub home_win_prob: f64,
    pub draw_prob: f64,
    pub away_win_prob: f64,
    pub expected_home_goals: f64,
    pub expected_away_goals: f64,
    /// Most probable scorelines, highest first, deterministically ordered.
    pub top_scorelines: Vec<ScorelineProb>,
}

impl Prediction {
    pub fn label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

/// Runs the goal model for one fixture against a rating snapshot. A team
/// with no rating history is rejected rather than defaulted to the
/// baseline: an unknown name at prediction time means the ingestion layer
/// skipped it, and hiding that would mask a data problem.
pub fn predict(
    fixture: &MatchRecord,
    snapshot: &RatingSnapshot,
    cfg: &ModelConfig,
) -> Result<Prediction> {
    if fixture.home_team == fixture.away_team {
        return Err(PredictError::InvalidInput(format!(
            "{} lists the same team on both sides",
            fixture.label()
        )));
    }
    for team in [&fixture.home_team, &fixture.away_team] {
        if !snapshot.contains(team) {
            return Err(PredictError::InvalidInput(format!(
                "team {team} has no rating history; ingest its results before predicting"
            )));
        }
    }

    let (lambda_home, lambda_away) = goal_model::expected_goals(fixture, snapshot, cfg)?;
    let grid = goal_model::score_distribution(lambda_home, lambda_away, cfg.max_goals);
    let probs = goal_model::outcome_probabilities(&grid);
    let top_scorelines = rank_scorelines(&grid, cfg.top_n_scorelines);

    Ok(Prediction {
        date: fixture.date,
        competition: fixture.competition.clone(),
        home_team: fixture.home_team.clone(),
        away_team: fixture.away_team.clone(),
        home_win_prob: probs.home_win,
        draw_prob: probs.draw,
        away_win_prob: probs.away_win,
        expected_home_goals: lambda_home,
        expected_away_goals: lambda_away,
        top_scorelines,
    })
}

/// Top-N cells under a total order that stays reproducible across runs:
/// probability descending, then fewer total goals, then lexicographic on
/// (home, away).
pub fn rank_scorelines(grid: &[ScorelineProb], top_n: usize) -> Vec<ScorelineProb> {
    let mut ranked = grid.to_vec();
    ranked.sort_by(|a, b| {
        b.prob
            .partial_cmp(&a.prob)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                (a.home_goals + a.away_goals).cmp(&(b.home_goals + b.away_goals))
            })
            .then_with(|| (a.home_goals, a.away_goals).cmp(&(b.home_goals, b.away_goals)))
    });
    ranked.truncate(top_n);
    ranked
}
