use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::ModelConfig;
use crate::error::{PredictError, Result};
use crate::record::MatchRecord;

/// Mutable per-team state: one rating plus a match counter. Created
/// lazily on first reference, never deleted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamRating {
    pub rating: f64,
    pub matches_played: u32,
}

/// What a single update did. The away change is the exact negation of
/// `home_change`; rating mass is conserved across the pair.
#[derive(Debug, Clone, Copy)]
pub struct RatingDelta {
    pub expected_home: f64,
    pub score_home: f64,
    pub home_change: f64,
    pub home_after: f64,
    pub away_after: f64,
}

/// Read-only view of every rating at a point in processing order. Handed
/// to the goal model so it never touches the engine's mutable state.
#[derive(Debug, Clone, Default)]
pub struct RatingSnapshot {
    ratings: HashMap<String, f64>,
}

impl RatingSnapshot {
    pub fn rating(&self, team: &str) -> Option<f64> {
        self.ratings.get(team).copied()
    }

    pub fn contains(&self, team: &str) -> bool {
        self.ratings.contains_key(team)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ratings
            .iter()
            .map(|(team, rating)| (team.as_str(), *rating))
    }
}

/// Incremental Elo ratings over an ordered match history. Ratings are
/// path-dependent, so history must be replayed oldest first; the engine
/// rejects sequences that break that order instead of absorbing them.
///
/// One engine per rating universe; callers wanting isolation per
/// competition run several side by side. No global state, no internal
/// locking: a caller using the engine from more than one thread must
/// serialize access itself.
#[derive(Debug, Clone)]
pub struct RatingEngine {
    baseline: f64,
    k: f64,
    teams: HashMap<String, TeamRating>,
}

impl RatingEngine {
    pub fn new(baseline: f64, k: f64) -> Self {
        Self {
            baseline,
            k,
            teams: HashMap::new(),
        }
    }

    pub fn from_config(cfg: &ModelConfig) -> Self {
        Self::new(cfg.baseline_rating, cfg.k_factor)
    }

    /// Seeds every named team at the baseline. Idempotent: a team already
    /// rated keeps its current value.
    pub fn initialize<I, S>(&mut self, teams: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for team in teams {
            self.teams.entry(team.into()).or_insert(TeamRating {
                rating: self.baseline,
                matches_played: 0,
            });
        }
    }

    /// Restores a persisted rating verbatim, replacing any current entry.
    pub fn seed(&mut self, team: &str, rating: f64, matches_played: u32) {
        self.teams.insert(
            team.to_string(),
            TeamRating {
                rating,
                matches_played,
            },
        );
    }

    /// Applies one finished match. Both teams move together or neither
    /// does: every failure path returns before the first write.
    pub fn apply(&mut self, m: &MatchRecord) -> Result<RatingDelta> {
        let (home_goals, away_goals) = m
            .score()
            .ok_or_else(|| PredictError::InvalidInput(format!("{} has no final score", m.label())))?;
        if m.home_team == m.away_team {
            return Err(PredictError::InvalidInput(format!(
                "{} lists the same team on both sides",
                m.label()
            )));
        }

        let r_home = self.current_rating(&m.home_team);
        let r_away = self.current_rating(&m.away_team);
        let expected_home = expected_score(r_home, r_away);
        let score_home = if home_goals > away_goals {
            1.0
        } else if home_goals < away_goals {
            0.0
        } else {
            0.5
        };
        let home_change = self.k * (score_home - expected_home);

        let home = self.entry(&m.home_team);
        home.rating += home_change;
        home.matches_played += 1;
        let home_after = home.rating;

        let away = self.entry(&m.away_team);
        away.rating -= home_change;
        away.matches_played += 1;
        let away_after = away.rating;

        Ok(RatingDelta {
            expected_home,
            score_home,
            home_change,
            home_after,
            away_after,
        })
    }

    /// Applies a date-ordered sequence of finished matches. The whole
    /// sequence is validated before the first rating moves, so a bad
    /// record leaves every rating untouched.
    pub fn replay(&mut self, matches: &[MatchRecord]) -> Result<usize> {
        let mut prev: Option<NaiveDate> = None;
        for (idx, m) in matches.iter().enumerate() {
            if !m.is_completed() {
                return Err(PredictError::InvalidInput(format!(
                    "record {idx} ({}) is not a finished match",
                    m.label()
                )));
            }
            if m.home_team == m.away_team {
                return Err(PredictError::InvalidInput(format!(
                    "record {idx} ({}) lists the same team on both sides",
                    m.label()
                )));
            }
            if let Some(prev_date) = prev
                && m.date < prev_date
            {
                return Err(PredictError::InvalidInput(format!(
                    "record {idx} dated {} arrives after {prev_date}; replay must be oldest first",
                    m.date
                )));
            }
            prev = Some(m.date);
        }

        for m in matches {
            self.apply(m)?;
        }
        Ok(matches.len())
    }

    /// Read-only copy of every current rating. No side effects.
    pub fn snapshot(&self) -> RatingSnapshot {
        RatingSnapshot {
            ratings: self
                .teams
                .iter()
                .map(|(team, state)| (team.clone(), state.rating))
                .collect(),
        }
    }

    pub fn team(&self, name: &str) -> Option<&TeamRating> {
        self.teams.get(name)
    }

    pub fn ratings(&self) -> impl Iterator<Item = (&String, &TeamRating)> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    fn current_rating(&self, team: &str) -> f64 {
        self.teams
            .get(team)
            .map(|state| state.rating)
            .unwrap_or(self.baseline)
    }

    fn entry(&mut self, team: &str) -> &mut TeamRating {
        self.teams.entry(team.to_string()).or_insert(TeamRating {
            rating: self.baseline,
            matches_played: 0,
        })
    }
}

/// Logistic Elo expectation for the home side.
pub fn expected_score(r_home: f64, r_away: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((r_away - r_home) / 400.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_expect_a_coin_flip() {
        assert!((expected_score(1500.0, 1500.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn a_400_point_favorite_expects_about_ninety_percent() {
        let e = expected_score(1900.0, 1500.0);
        assert!((e - 10.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn expectations_are_complementary() {
        let e_home = expected_score(1620.0, 1480.0);
        let e_away = expected_score(1480.0, 1620.0);
        assert!((e_home + e_away - 1.0).abs() < 1e-12);
    }
}
