use crate::game::room::FinishedRun;
use crate::shared::names::sanitize_player_name;
use anyhow::Context;
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::UnboundedReceiver;

pub const MAX_SCORE: i64 = 1_000_000;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardEntry {
  pub name: String,
  pub score: i64,
  pub tier: i64,
  pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct ScoreStore {
  db: SqlitePool,
}

impl ScoreStore {
  pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
    ensure_db_dir(database_url)
      .with_context(|| format!("preparing database path for {database_url}"))?;
    let db = SqlitePoolOptions::new()
      .max_connections(5)
      .connect(database_url)
      .await
      .with_context(|| format!("connecting to {database_url}"))?;
    sqlx::migrate!("./migrations")
      .run(&db)
      .await
      .context("running migrations")?;
    Ok(Self { db })
  }

  pub async fn best_score(&self) -> anyhow::Result<i64> {
    let row = sqlx::query("SELECT COALESCE(MAX(score), 0) AS best FROM scores")
      .fetch_one(&self.db)
      .await
      .context("loading best score")?;
    Ok(row.try_get("best")?)
  }

  pub async fn record(&self, run: &FinishedRun) -> anyhow::Result<()> {
    let name = sanitize_player_name(&run.name, "Player");
    let score = run.score.clamp(0, MAX_SCORE);
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
      "INSERT INTO scores (id, name, score, tier, ticks, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(score)
    .bind(run.tier as i64)
    .bind(run.ticks.min(i64::MAX as u64) as i64)
    .bind(current_time_millis())
    .execute(&self.db)
    .await
    .context("inserting finished run")?;
    Ok(())
  }

  pub async fn leaderboard(&self, limit: i64) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let rows = sqlx::query(
      "SELECT name, score, tier, created_at FROM scores ORDER BY score DESC, created_at ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&self.db)
    .await
    .context("loading leaderboard")?;

    let scores = rows
      .into_iter()
      .filter_map(|row| {
        Some(LeaderboardEntry {
          name: row.try_get("name").ok()?,
          score: row.try_get("score").ok()?,
          tier: row.try_get("tier").ok()?,
          created_at: row.try_get("created_at").ok()?,
        })
      })
      .collect();
    Ok(scores)
  }
}

pub async fn record_runs(store: ScoreStore, mut runs: UnboundedReceiver<FinishedRun>) {
  while let Some(run) = runs.recv().await {
    if run.score <= 0 {
      continue;
    }
    match store.record(&run).await {
      Ok(()) => tracing::info!(name = %run.name, score = run.score, tier = run.tier, "run recorded"),
      Err(error) => tracing::warn!(?error, room_id = %run.room_id, "failed to record run"),
    }
  }
}

pub fn ensure_db_dir(database_url: &str) -> anyhow::Result<()> {
  if database_url.starts_with("sqlite::memory:") {
    return Ok(());
  }
  let path = database_url
    .strip_prefix("sqlite://")
    .or_else(|| database_url.strip_prefix("sqlite:"));
  let Some(path) = path else { return Ok(()) };
  let path = path.split('?').next().unwrap_or_default();
  if path.is_empty() || path == ":memory:" {
    return Ok(());
  }
  let db_path = PathBuf::from(path);
  if let Some(parent) = db_path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  if !db_path.exists() {
    let _ = std::fs::File::create(&db_path)?;
  }
  Ok(())
}

fn current_time_millis() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as i64
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn memory_store() -> ScoreStore {
    let db = SqlitePoolOptions::new()
      .max_connections(1)
      .connect("sqlite::memory:")
      .await
      .expect("memory db");
    sqlx::migrate!("./migrations").run(&db).await.expect("migrate");
    ScoreStore { db }
  }

  fn run(name: &str, score: i64) -> FinishedRun {
    FinishedRun {
      room_id: "room".to_string(),
      name: name.to_string(),
      score,
      tier: 1,
      ticks: 120,
    }
  }

  #[tokio::test]
  async fn best_score_starts_at_zero() {
    let store = memory_store().await;
    assert_eq!(store.best_score().await.expect("best"), 0);
  }

  #[tokio::test]
  async fn leaderboard_orders_by_score() {
    let store = memory_store().await;
    store.record(&run("low", 3)).await.expect("record");
    store.record(&run("high", 42)).await.expect("record");
    store.record(&run("mid", 17)).await.expect("record");

    assert_eq!(store.best_score().await.expect("best"), 42);
    let top = store.leaderboard(2).await.expect("leaderboard");
    let names: Vec<&str> = top.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["high", "mid"]);
    assert_eq!(top[0].tier, 1);
  }

  #[tokio::test]
  async fn recorded_names_are_sanitized() {
    let store = memory_store().await;
    store
      .record(&run("   a    very long name that keeps going  ", 5))
      .await
      .expect("record");
    store.record(&run("   ", 4)).await.expect("record");
    let entries = store.leaderboard(10).await.expect("leaderboard");
    assert_eq!(entries[0].name, "a very long name tha");
    assert_eq!(entries[1].name, "Player");
  }

  #[tokio::test]
  async fn writer_skips_empty_runs() {
    let store = memory_store().await;
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tx.send(run("zero", 0)).expect("send");
    tx.send(run("scored", 8)).expect("send");
    drop(tx);
    record_runs(store.clone(), rx).await;
    let entries = store.leaderboard(10).await.expect("leaderboard");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "scored");
  }

  #[test]
  fn memory_urls_need_no_directory() {
    assert!(ensure_db_dir("sqlite::memory:").is_ok());
    assert!(ensure_db_dir("postgres://localhost/db").is_ok());
  }
}
