use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, Row, params};

use crate::elo::TeamRating;
use crate::record::MatchRecord;

const CACHE_DIR: &str = "fixturecast";
const DB_FILE: &str = "matches.sqlite";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            competition TEXT NOT NULL,
            season INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NULL,
            away_goals INTEGER NULL,
            outcome TEXT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(date, competition, home_team, away_team)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
        CREATE INDEX IF NOT EXISTS idx_matches_competition ON matches(competition);

        CREATE TABLE IF NOT EXISTS ratings (
            team TEXT PRIMARY KEY,
            rating REAL NOT NULL,
            matches_played INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Upserts a batch of match rows in one transaction. A row re-ingested
/// with a newly recorded score updates in place instead of duplicating.
pub fn upsert_matches(conn: &mut Connection, rows: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin match upsert")?;
    for row in rows {
        upsert_match(&tx, row)?;
    }
    tx.commit().context("commit match upsert")?;
    Ok(rows.len())
}

fn upsert_match(tx: &rusqlite::Transaction<'_>, m: &MatchRecord) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO matches (
            date, competition, season, home_team, away_team,
            home_goals, away_goals, outcome, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(date, competition, home_team, away_team) DO UPDATE SET
            season = excluded.season,
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals,
            outcome = excluded.outcome,
            updated_at = excluded.updated_at
        "#,
        params![
            m.date.format(DATE_FORMAT).to_string(),
            m.competition,
            m.season,
            m.home_team,
            m.away_team,
            m.home_goals,
            m.away_goals,
            m.outcome().map(|c| c.to_string()),
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert match")?;
    Ok(())
}

/// Finished matches, oldest first, tie-broken on insertion order so a
/// replay over the result is deterministic.
pub fn load_finished_matches(
    conn: &Connection,
    competition: Option<&str>,
) -> Result<Vec<MatchRecord>> {
    load_matches(
        conn,
        competition,
        "home_goals IS NOT NULL AND away_goals IS NOT NULL",
    )
}

/// Scheduled fixtures: rows without a recorded score.
pub fn load_upcoming_fixtures(
    conn: &Connection,
    competition: Option<&str>,
) -> Result<Vec<MatchRecord>> {
    load_matches(conn, competition, "home_goals IS NULL OR away_goals IS NULL")
}

fn load_matches(
    conn: &Connection,
    competition: Option<&str>,
    filter: &str,
) -> Result<Vec<MatchRecord>> {
    let mut sql = format!(
        "SELECT date, competition, season, home_team, away_team, home_goals, away_goals
         FROM matches WHERE {filter}"
    );
    if competition.is_some() {
        sql.push_str(" AND competition = ?1");
    }
    sql.push_str(" ORDER BY date ASC, id ASC");

    let mut stmt = conn.prepare(&sql).context("prepare match query")?;
    let mut out = Vec::new();
    match competition {
        Some(code) => {
            let rows = stmt
                .query_map(params![code], decode_match_row)
                .context("query matches")?;
            for row in rows {
                out.push(convert_match_row(row.context("decode match row")?)?);
            }
        }
        None => {
            let rows = stmt
                .query_map([], decode_match_row)
                .context("query matches")?;
            for row in rows {
                out.push(convert_match_row(row.context("decode match row")?)?);
            }
        }
    }
    Ok(out)
}

type RawMatchRow = (
    String,
    String,
    i32,
    String,
    String,
    Option<i64>,
    Option<i64>,
);

fn decode_match_row(row: &Row<'_>) -> rusqlite::Result<RawMatchRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn convert_match_row(raw: RawMatchRow) -> Result<MatchRecord> {
    let (date, competition, season, home_team, away_team, home_goals, away_goals) = raw;
    Ok(MatchRecord {
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .with_context(|| format!("unparseable stored date {date}"))?,
        competition,
        season,
        home_team,
        away_team,
        home_goals: opt_goals(home_goals)?,
        away_goals: opt_goals(away_goals)?,
    })
}

fn opt_goals(v: Option<i64>) -> Result<Option<u32>> {
    v.map(|g| u32::try_from(g).with_context(|| format!("goal count {g} out of range")))
        .transpose()
}

/// Writes every rating in one transaction so a crash cannot leave half
/// the teams updated.
pub fn save_ratings<'a, I>(conn: &mut Connection, ratings: I) -> Result<usize>
where
    I: IntoIterator<Item = (&'a String, &'a TeamRating)>,
{
    let tx = conn.transaction().context("begin ratings save")?;
    let mut written = 0usize;
    for (team, state) in ratings {
        tx.execute(
            r#"
            INSERT INTO ratings (team, rating, matches_played, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(team) DO UPDATE SET
                rating = excluded.rating,
                matches_played = excluded.matches_played,
                updated_at = excluded.updated_at
            "#,
            params![
                team,
                state.rating,
                state.matches_played,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("upsert rating")?;
        written += 1;
    }
    tx.commit().context("commit ratings save")?;
    Ok(written)
}

pub fn load_ratings(conn: &Connection) -> Result<Vec<(String, TeamRating)>> {
    let mut stmt = conn
        .prepare("SELECT team, rating, matches_played FROM ratings ORDER BY team ASC")
        .context("prepare ratings query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                TeamRating {
                    rating: row.get::<_, f64>(1)?,
                    matches_played: row.get::<_, u32>(2)?,
                },
            ))
        })
        .context("query ratings")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode rating row")?);
    }
    Ok(out)
}
