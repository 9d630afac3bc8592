use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

use crate::config::ModelConfig;
use crate::elo::RatingEngine;
use crate::ingest;
use crate::predict;
use crate::remote;
use crate::state::{Delta, TrainSummary, WorkerCommand};
use crate::store;

/// Runs ingestion, training, and prediction off the UI thread. The
/// worker owns the store connection and the rating engine outright, so
/// all model access is serialized by construction.
pub fn spawn_worker(tx: Sender<Delta>, cmd_rx: Receiver<WorkerCommand>, cfg: ModelConfig) {
    thread::spawn(move || {
        let mut ctx = match WorkerCtx::open(cfg) {
            Ok(ctx) => ctx,
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Store unavailable: {err:#}")));
                return;
            }
        };
        if !ctx.engine.is_empty() {
            let _ = tx.send(Delta::Log(format!(
                "[INFO] Restored ratings for {} teams",
                ctx.engine.len()
            )));
        }

        while let Ok(cmd) = cmd_rx.recv() {
            let result = match cmd {
                WorkerCommand::FetchRemote {
                    competition,
                    season,
                } => ctx.fetch_remote(&tx, &competition, season),
                WorkerCommand::LoadLocal { dir } => ctx.load_local(&tx, &dir),
                WorkerCommand::Train => ctx.train(&tx),
                WorkerCommand::Predict => ctx.predict_upcoming(&tx),
            };
            if let Err(err) = result {
                let _ = tx.send(Delta::Log(format!("[WARN] {err:#}")));
            }
        }
    });
}

struct WorkerCtx {
    conn: Connection,
    engine: RatingEngine,
    cfg: ModelConfig,
}

impl WorkerCtx {
    fn open(cfg: ModelConfig) -> Result<Self> {
        let path = store::default_db_path()
            .ok_or_else(|| anyhow!("no writable cache directory for the match store"))?;
        let conn = store::open_db(&path)?;
        let mut engine = RatingEngine::from_config(&cfg);
        for (team, state) in store::load_ratings(&conn)? {
            engine.seed(&team, state.rating, state.matches_played);
        }
        Ok(Self { conn, engine, cfg })
    }

    fn fetch_remote(
        &mut self,
        tx: &Sender<Delta>,
        competition: &str,
        season: Option<i32>,
    ) -> Result<()> {
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Fetching {competition} from football-data.org"
        )));
        let outcome = remote::fetch_competition_matches(competition, season)?;
        let inserted = store::upsert_matches(&mut self.conn, &outcome.records)?;
        let _ = tx.send(Delta::Stored {
            inserted,
            skipped: outcome.skipped,
        });
        Ok(())
    }

    fn load_local(&mut self, tx: &Sender<Delta>, dir: &Path) -> Result<()> {
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Loading match files from {}",
            dir.display()
        )));
        let outcome = ingest::load_ndjson_dir(dir)?;
        if outcome.skipped_files > 0 {
            let _ = tx.send(Delta::Log(format!(
                "[WARN] {} files were unreadable",
                outcome.skipped_files
            )));
        }
        let inserted = store::upsert_matches(&mut self.conn, &outcome.records)?;
        let _ = tx.send(Delta::Stored {
            inserted,
            skipped: outcome.skipped_lines,
        });
        Ok(())
    }

    /// Rebuilds ratings from the full stored history. Retraining from
    /// scratch keeps the trajectory consistent with whatever the store
    /// currently holds, including corrected results.
    fn train(&mut self, tx: &Sender<Delta>) -> Result<()> {
        let matches = store::load_finished_matches(&self.conn, None)?;
        if matches.is_empty() {
            let _ = tx.send(Delta::Log(
                "[INFO] No finished matches in store; fetch or load first".to_string(),
            ));
            return Ok(());
        }

        let mut engine = RatingEngine::from_config(&self.cfg);
        let applied = engine.replay(&matches).context("replay stored history")?;
        self.engine = engine;
        store::save_ratings(&mut self.conn, self.engine.ratings())?;

        let _ = tx.send(Delta::Trained(TrainSummary {
            matches_applied: applied,
            teams_rated: self.engine.len(),
        }));
        Ok(())
    }

    fn predict_upcoming(&self, tx: &Sender<Delta>) -> Result<()> {
        let fixtures = store::load_upcoming_fixtures(&self.conn, None)?;
        if fixtures.is_empty() {
            let _ = tx.send(Delta::Log(
                "[INFO] No scheduled fixtures in store".to_string(),
            ));
            return Ok(());
        }
        let snapshot = self.engine.snapshot();
        if snapshot.is_empty() {
            let _ = tx.send(Delta::Log(
                "[WARN] No ratings yet; train before predicting".to_string(),
            ));
            return Ok(());
        }

        let mut predictions = Vec::new();
        for fixture in &fixtures {
            match predict::predict(fixture, &snapshot, &self.cfg) {
                Ok(p) => predictions.push(p),
                Err(err) => {
                    let _ = tx.send(Delta::Log(format!("[WARN] {}: {err}", fixture.label())));
                }
            }
        }
        let _ = tx.send(Delta::Predictions(predictions));
        Ok(())
    }
}
