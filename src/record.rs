use chrono::NaiveDate;

/// A normalized match row: a finished result when both goal counts are
/// present, a scheduled fixture when both are absent. Immutable once
/// built; the ingestion layers construct these and nothing mutates them.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub competition: String,
    pub season: i32,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
}

impl MatchRecord {
    pub fn is_completed(&self) -> bool {
        self.home_goals.is_some() && self.away_goals.is_some()
    }

    /// Final score, only when both counts are recorded.
    pub fn score(&self) -> Option<(u32, u32)> {
        Some((self.home_goals?, self.away_goals?))
    }

    pub fn outcome(&self) -> Option<char> {
        let (home_goals, away_goals) = self.score()?;
        if home_goals > away_goals {
            Some('H')
        } else if home_goals < away_goals {
            Some('A')
        } else {
            Some('D')
        }
    }

    pub fn label(&self) -> String {
        format!("{} vs {} ({})", self.home_team, self.away_team, self.date)
    }
}
