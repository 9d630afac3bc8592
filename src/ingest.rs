use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;

use crate::record::MatchRecord;

/// Loader result. Bad lines and unreadable files are counted rather than
/// aborting the load: openfootball exports are hand-maintained and a few
/// stray lines should not sink an entire import.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: Vec<MatchRecord>,
    pub skipped_lines: usize,
    pub skipped_files: usize,
}

/// Reads every file in `dir` as newline-delimited JSON match objects.
/// Files are visited in name order so repeated loads see the same
/// sequence.
pub fn load_ndjson_dir(dir: &Path) -> Result<LoadOutcome> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("read match directory {}", dir.display()))?;
    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut out = LoadOutcome::default();
    for path in paths {
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let parsed = parse_ndjson(&raw);
                out.records.extend(parsed.records);
                out.skipped_lines += parsed.skipped_lines;
            }
            Err(_) => out.skipped_files += 1,
        }
    }
    Ok(out)
}

/// Parses newline-delimited JSON objects with keys `date`, `competition`,
/// `season`, `home`, `away`, `home_goals`, `away_goals`. Goal fields may
/// be null for fixtures not yet played.
pub fn parse_ndjson(raw: &str) -> LoadOutcome {
    let mut out = LoadOutcome::default();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line)
            .ok()
            .and_then(|v| parse_line(&v))
        {
            Some(rec) => out.records.push(rec),
            None => out.skipped_lines += 1,
        }
    }
    out
}

fn parse_line(v: &Value) -> Option<MatchRecord> {
    let date = NaiveDate::parse_from_str(v.get("date")?.as_str()?, "%Y-%m-%d").ok()?;
    let home_team = non_empty(v.get("home")?.as_str()?)?;
    let away_team = non_empty(v.get("away")?.as_str()?)?;
    if home_team == away_team {
        return None;
    }

    let competition = v
        .get("competition")
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("OPEN")
        .to_string();
    let season = v
        .get("season")
        .and_then(|x| x.as_i64())
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0);

    let home_goals = v.get("home_goals").and_then(goal_value);
    let away_goals = v.get("away_goals").and_then(goal_value);
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

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn goal_value(v: &Value) -> Option<u32> {
    v.as_u64().and_then(|n| u32::try_from(n).ok())
}
