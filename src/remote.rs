use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::record::MatchRecord;

const FOOTBALL_DATA_BASE: &str = "https://api.football-data.org/v4";
const API_KEY_ENV: &str = "FOOTBALL_DATA_API_KEY";
const REQUEST_TIMEOUT_SECS: u64 = 30;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Parsed rows plus how many payload entries were unusable.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub records: Vec<MatchRecord>,
    pub skipped: usize,
}

/// Pulls one competition's matches (finished and scheduled) from the
/// football-data.org v4 API. The free tier works without a key for some
/// competitions; when `FOOTBALL_DATA_API_KEY` is set it is sent as the
/// `X-Auth-Token` header.
pub fn fetch_competition_matches(
    competition: &str,
    season: Option<i32>,
) -> Result<FetchOutcome> {
    let client = http_client()?;
    let mut url = format!("{FOOTBALL_DATA_BASE}/competitions/{competition}/matches");
    if let Some(season) = season {
        url.push_str(&format!("?season={season}"));
    }

    let mut req = client.get(&url);
    if let Ok(key) = std::env::var(API_KEY_ENV)
        && !key.trim().is_empty()
    {
        req = req.header("X-Auth-Token", key.trim());
    }

    let resp = req.send().context("competition matches request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status}: {body}"));
    }
    parse_matches_json(&body, competition)
}

/// Pure parser over the v4 `matches` payload, separated so tests can run
/// it against canned bodies without a network.
pub fn parse_matches_json(raw: &str, fallback_competition: &str) -> Result<FetchOutcome> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(FetchOutcome::default());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid matches json")?;
    let arr = v
        .get("matches")
        .and_then(|x| x.as_array())
        .ok_or_else(|| anyhow!("missing matches array"))?;

    let mut out = FetchOutcome::default();
    for item in arr {
        match parse_match(item, fallback_competition) {
            Some(rec) => out.records.push(rec),
            None => out.skipped += 1,
        }
    }
    Ok(out)
}

fn parse_match(v: &Value, fallback_competition: &str) -> Option<MatchRecord> {
    let utc = v.get("utcDate")?.as_str()?;
    let date = NaiveDate::parse_from_str(utc.get(..10)?, "%Y-%m-%d").ok()?;

    let competition = v
        .get("competition")
        .and_then(|c| c.get("code"))
        .and_then(|x| x.as_str())
        .unwrap_or(fallback_competition)
        .to_string();
    let season = v
        .get("season")
        .and_then(|s| s.get("startDate"))
        .and_then(|x| x.as_str())
        .and_then(|s| s.get(..4))
        .and_then(|year| year.parse::<i32>().ok())
        .unwrap_or(0);

    let home_team = team_name(v.get("homeTeam")?)?;
    let away_team = team_name(v.get("awayTeam")?)?;
    if home_team == away_team {
        return None;
    }

    let full_time = v.get("score").and_then(|s| s.get("fullTime"));
    let home_goals = full_time.and_then(|t| t.get("home")).and_then(score_value);
    let away_goals = full_time.and_then(|t| t.get("away")).and_then(score_value);
    // A half-recorded score is unusable either way; treat it as scheduled.
    let (home_goals, away_goals) = match (home_goals, away_goals) {
        (Some(h), Some(a)) => (Some(h), Some(a)),
        _ => (None, None),
    };

    Some(MatchRecord {
        date,
        competition,
        season,
        home_team,
        away_team,
        home_goals,
        away_goals,
    })
}

fn team_name(v: &Value) -> Option<String> {
    let name = v
        .get("name")
        .and_then(|x| x.as_str())
        .or_else(|| v.get("shortName").and_then(|x| x.as_str()))?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn score_value(v: &Value) -> Option<u32> {
    v.as_u64().and_then(|n| u32::try_from(n).ok())
}
