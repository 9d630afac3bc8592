use std::env;

use serde::{Deserialize, Serialize};

/// Tunable model constants. Every field can be overridden from the
/// environment; out-of-range overrides are clamped rather than rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelConfig {
    pub baseline_rating: f64,
    pub k_factor: f64,
    /// Multiplicative boost on the home side's expected goals.
    pub home_advantage: f64,
    /// League-average goals per team per match.
    pub avg_goals_per_team: f64,
    /// Stretch factor on the rating differential in the goals link.
    pub elo_scale: f64,
    /// Goal cap for the scoreline grid; mass beyond it is dropped.
    pub max_goals: u32,
    pub top_n_scorelines: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            baseline_rating: 1500.0,
            k_factor: 20.0,
            home_advantage: 1.30,
            avg_goals_per_team: 1.35,
            elo_scale: 1.0,
            max_goals: 10,
            top_n_scorelines: 5,
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            baseline_rating: env_f64("ELO_BASELINE", d.baseline_rating).clamp(100.0, 3000.0),
            k_factor: env_f64("ELO_K_FACTOR", d.k_factor).clamp(1.0, 100.0),
            home_advantage: env_f64("HOME_ADVANTAGE", d.home_advantage).clamp(0.5, 3.0),
            avg_goals_per_team: env_f64("AVG_GOALS_PER_TEAM", d.avg_goals_per_team)
                .clamp(0.1, 5.0),
            elo_scale: env_f64("ELO_SCALE", d.elo_scale).clamp(0.1, 5.0),
            max_goals: env_u32("MAX_GOALS", d.max_goals).clamp(4, 25),
            top_n_scorelines: env_usize("TOP_SCORELINES", d.top_n_scorelines).clamp(1, 20),
        }
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|val| val.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|val| val.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
