use std::collections::VecDeque;
use std::path::PathBuf;

use crate::predict::Prediction;

const LOG_CAPACITY: usize = 200;

/// Commands from the UI to the worker thread.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    FetchRemote {
        competition: String,
        season: Option<i32>,
    },
    LoadLocal {
        dir: PathBuf,
    },
    Train,
    Predict,
}

/// Messages from the worker thread back to the UI.
#[derive(Debug)]
pub enum Delta {
    Log(String),
    Stored { inserted: usize, skipped: usize },
    Trained(TrainSummary),
    Predictions(Vec<Prediction>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrainSummary {
    pub matches_applied: usize,
    pub teams_rated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Date,
    HomeWin,
}

impl SortMode {
    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Date => "date",
            SortMode::HomeWin => "home win%",
        }
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub predictions: Vec<Prediction>,
    pub selected: usize,
    pub sort: SortMode,
    pub train: Option<TrainSummary>,
    pub help_overlay: bool,
    pub log: VecDeque<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        if self.log.len() >= LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line.into());
    }

    pub fn select_next(&mut self) {
        if !self.predictions.is_empty() {
            self.selected = (self.selected + 1).min(self.predictions.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_prediction(&self) -> Option<&Prediction> {
        self.predictions.get(self.selected)
    }

    pub fn cycle_sort(&mut self) {
        self.sort = match self.sort {
            SortMode::Date => SortMode::HomeWin,
            SortMode::HomeWin => SortMode::Date,
        };
        self.sort_predictions();
    }

    fn sort_predictions(&mut self) {
        match self.sort {
            SortMode::Date => self.predictions.sort_by(|a, b| {
                a.date
                    .cmp(&b.date)
                    .then_with(|| a.home_team.cmp(&b.home_team))
                    .then_with(|| a.away_team.cmp(&b.away_team))
            }),
            SortMode::HomeWin => self.predictions.sort_by(|a, b| {
                b.home_win_prob
                    .partial_cmp(&a.home_win_prob)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.date.cmp(&b.date))
                    .then_with(|| a.home_team.cmp(&b.home_team))
            }),
        }
        self.selected = self.selected.min(self.predictions.len().saturating_sub(1));
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Log(line) => state.push_log(line),
        Delta::Stored { inserted, skipped } => {
            if skipped > 0 {
                state.push_log(format!(
                    "[INFO] Stored {inserted} matches ({skipped} rows skipped)"
                ));
            } else {
                state.push_log(format!("[INFO] Stored {inserted} matches"));
            }
        }
        Delta::Trained(summary) => {
            state.train = Some(summary);
            state.push_log(format!(
                "[INFO] Replayed {} matches; {} teams rated",
                summary.matches_applied, summary.teams_rated
            ));
        }
        Delta::Predictions(predictions) => {
            state.push_log(format!("[INFO] {} fixtures predicted", predictions.len()));
            state.predictions = predictions;
            state.selected = 0;
            state.sort_predictions();
        }
    }
}
