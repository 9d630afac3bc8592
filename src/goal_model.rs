use crate::config::ModelConfig;
use crate::elo::RatingSnapshot;
use crate::error::{PredictError, Result};
use crate::record::MatchRecord;

/// One cell of the truncated joint score grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorelineProb {
    pub home_goals: u32,
    pub away_goals: u32,
    pub prob: f64,
}

/// Win/draw/loss mass summed from a truncated grid. The three values sum
/// to slightly less than 1.0: the tail beyond the goal cap is dropped,
/// and deliberately not rescaled away.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeProbs {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

impl OutcomeProbs {
    pub fn total(&self) -> f64 {
        self.home_win + self.draw + self.away_win
    }
}

/// Converts the rating differential into expected-goals rates via an
/// exponential link on the Elo scale. Both teams must be present in the
/// snapshot; a missing team is a data-quality fault, not a case for a
/// baseline fallback.
pub fn expected_goals(
    fixture: &MatchRecord,
    snapshot: &RatingSnapshot,
    cfg: &ModelConfig,
) -> Result<(f64, f64)> {
    let r_home = snapshot.rating(&fixture.home_team).ok_or_else(|| {
        PredictError::InvalidInput(format!("no rating history for {}", fixture.home_team))
    })?;
    let r_away = snapshot.rating(&fixture.away_team).ok_or_else(|| {
        PredictError::InvalidInput(format!("no rating history for {}", fixture.away_team))
    })?;

    let edge = (r_home - r_away) / 400.0 * cfg.elo_scale;
    let lambda_home = cfg.avg_goals_per_team * cfg.home_advantage * 10.0_f64.powf(edge);
    let lambda_away = cfg.avg_goals_per_team * 10.0_f64.powf(-edge);

    for (team, lambda) in [
        (&fixture.home_team, lambda_home),
        (&fixture.away_team, lambda_away),
    ] {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(PredictError::Model(format!(
                "expected goals for {team} degenerated to {lambda}"
            )));
        }
    }
    Ok((lambda_home, lambda_away))
}

/// Joint independent-Poisson distribution over goal counts in
/// `[0, max_goals]` for each side. The grid is truncated at the cap and
/// NOT renormalized: cells sum to slightly under 1.0 and callers must
/// treat the missing tail as dropped, not as a bug.
pub fn score_distribution(
    lambda_home: f64,
    lambda_away: f64,
    max_goals: u32,
) -> Vec<ScorelineProb> {
    let pmf_home = poisson_pmf(lambda_home, max_goals);
    let pmf_away = poisson_pmf(lambda_away, max_goals);

    let mut out = Vec::with_capacity(pmf_home.len() * pmf_away.len());
    for (h, p_h) in pmf_home.iter().enumerate() {
        for (a, p_a) in pmf_away.iter().enumerate() {
            out.push(ScorelineProb {
                home_goals: h as u32,
                away_goals: a as u32,
                prob: p_h * p_a,
            });
        }
    }
    out
}

/// Sums grid mass into home-win, draw, and away-win buckets. The sum
/// inherits the grid's truncation deficit and is preserved as-is.
pub fn outcome_probabilities(grid: &[ScorelineProb]) -> OutcomeProbs {
    let mut home_win = 0.0;
    let mut draw = 0.0;
    let mut away_win = 0.0;

    for cell in grid {
        if cell.home_goals > cell.away_goals {
            home_win += cell.prob;
        } else if cell.home_goals == cell.away_goals {
            draw += cell.prob;
        } else {
            away_win += cell.prob;
        }
    }

    OutcomeProbs {
        home_win,
        draw,
        away_win,
    }
}

// Multiplicative recurrence P(0) = e^-lambda, P(k) = P(k-1) * lambda / k.
// Stays finite for any k the grid can ask for, unlike a naive factorial.
fn poisson_pmf(lambda: f64, max_k: u32) -> Vec<f64> {
    let mut out = vec![0.0; max_k as usize + 1];
    out[0] = (-lambda).exp();
    for k in 1..out.len() {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}
