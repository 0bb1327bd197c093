#![deny(warnings)]

//! Persistence layer: player-progress stores and the SQLite save/run archive.
//!
//! The run controller only needs [`ProgressStore`]. The JSON file store is the
//! everyday save; the SQLite functions keep named save slots (progress encoded
//! with bincode) and a log of finished runs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use life_econ::PlayerProgress;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/main.db"
}

/// Returns the default JSON save path.
pub fn default_save_path() -> PathBuf {
    PathBuf::from("./saves/progress.json")
}

/// Load/save contract for the player-progress record.
pub trait ProgressStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<PlayerProgress>>;
    fn save(&mut self, progress: &PlayerProgress) -> Result<()>;
}

/// Load progress, falling back to a zeroed record when the store is empty or
/// unreadable.
pub fn load_or_default(store: &dyn ProgressStore) -> PlayerProgress {
    match store.load() {
        Ok(Some(p)) => p,
        Ok(None) => {
            info!("no saved progress, starting fresh");
            PlayerProgress::default()
        }
        Err(e) => {
            warn!(error = %e, "failed to load progress, starting fresh");
            PlayerProgress::default()
        }
    }
}

/// In-memory store, used by tests and headless demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<PlayerProgress>,
    saves: usize,
}

impl MemoryStore {
    pub fn with_progress(progress: PlayerProgress) -> Self {
        Self {
            saved: Some(progress),
            saves: 0,
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Option<PlayerProgress>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, progress: &PlayerProgress) -> Result<()> {
        self.saved = Some(progress.clone());
        self.saves += 1;
        Ok(())
    }
}

/// Pretty-printed JSON file. Writes go to a sibling temp file first and are
/// renamed into place, so a failed save leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<Option<PlayerProgress>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let progress = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(progress))
    }

    fn save(&mut self, progress: &PlayerProgress) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(progress)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), currency = progress.currency, "progress saved");
        Ok(())
    }
}

/// Compact binary snapshot of the progress record.
pub fn encode_progress(progress: &PlayerProgress) -> Result<Vec<u8>> {
    Ok(bincode::serialize(progress)?)
}

pub fn decode_progress(bytes: &[u8]) -> Result<PlayerProgress> {
    Ok(bincode::deserialize(bytes)?)
}

/// One finished run as stored in the run log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_number: u64,
    pub generations: u64,
    pub reason: String,
    /// Balance change over the run; negative if the player spent more than they earned.
    pub currency_delta: i64,
    pub score: u64,
    pub finished_at: DateTime<Utc>,
}

/// Open (creating if needed) the database and its tables.
pub async fn init_db(url: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS saves (
            slot TEXT PRIMARY KEY NOT NULL,
            progress BLOB NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS run_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_number INTEGER NOT NULL,
            generations INTEGER NOT NULL,
            reason TEXT NOT NULL,
            currency_delta INTEGER NOT NULL,
            score INTEGER NOT NULL,
            finished_at TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await?;
    Ok(pool)
}

/// Insert or replace the progress stored under `slot`.
pub async fn save_progress(pool: &SqlitePool, slot: &str, progress: &PlayerProgress) -> Result<()> {
    let blob = encode_progress(progress)?;
    sqlx::query(
        "INSERT INTO saves (slot, progress, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(slot) DO UPDATE
         SET progress = excluded.progress, updated_at = excluded.updated_at",
    )
    .bind(slot)
    .bind(blob)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    debug!(slot, "progress archived");
    Ok(())
}

/// Progress stored under `slot`, if any.
pub async fn load_progress(pool: &SqlitePool, slot: &str) -> Result<Option<PlayerProgress>> {
    let row = sqlx::query("SELECT progress FROM saves WHERE slot = ?1")
        .bind(slot)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let blob: Vec<u8> = row.try_get("progress")?;
            Ok(Some(decode_progress(&blob)?))
        }
        None => Ok(None),
    }
}

/// Append a finished run to the log. Returns the row id.
pub async fn record_run(pool: &SqlitePool, record: &RunRecord) -> Result<i64> {
    let res = sqlx::query(
        "INSERT INTO run_log (run_number, generations, reason, currency_delta, score, finished_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(i64::try_from(record.run_number)?)
    .bind(i64::try_from(record.generations)?)
    .bind(record.reason.as_str())
    .bind(record.currency_delta)
    .bind(i64::try_from(record.score)?)
    .bind(record.finished_at.to_rfc3339())
    .execute(pool)
    .await?;
    Ok(res.last_insert_rowid())
}

/// Most recent runs first.
pub async fn list_runs(pool: &SqlitePool, limit: u32) -> Result<Vec<RunRecord>> {
    let rows = sqlx::query(
        "SELECT run_number, generations, reason, currency_delta, score, finished_at
         FROM run_log ORDER BY id DESC LIMIT ?1",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let finished_at: String = row.try_get("finished_at")?;
        out.push(RunRecord {
            run_number: u64::try_from(row.try_get::<i64, _>("run_number")?)?,
            generations: u64::try_from(row.try_get::<i64, _>("generations")?)?,
            reason: row.try_get("reason")?,
            currency_delta: row.try_get("currency_delta")?,
            score: u64::try_from(row.try_get::<i64, _>("score")?)?,
            finished_at: DateTime::parse_from_rfc3339(&finished_at)?.with_timezone(&Utc),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use life_econ::UpgradeId;
    use proptest::prelude::*;

    fn sample() -> PlayerProgress {
        let mut p = PlayerProgress {
            currency: 987,
            total_runs: 12,
            ..Default::default()
        };
        p.levels.insert(UpgradeId::Multiplier, 2);
        p.levels.insert(UpgradeId::StampEfficiency, 5);
        p
    }

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("ascii-life-{}-{nanos}-{name}", std::process::id()))
    }

    struct BrokenStore;

    impl ProgressStore for BrokenStore {
        fn load(&self) -> Result<Option<PlayerProgress>> {
            anyhow::bail!("disk on fire")
        }
        fn save(&mut self, _: &PlayerProgress) -> Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    #[test]
    fn url_is_sqlite() {
        assert!(default_sqlite_url().starts_with("sqlite://"));
    }

    #[test]
    fn missing_or_broken_store_yields_default() {
        assert_eq!(load_or_default(&MemoryStore::default()), PlayerProgress::default());
        assert_eq!(load_or_default(&BrokenStore), PlayerProgress::default());
        assert_eq!(load_or_default(&MemoryStore::with_progress(sample())), sample());
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = temp_path("json");
        let mut store = JsonFileStore::new(dir.join("nested/progress.json"));
        assert_eq!(store.load().unwrap(), None);
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_json_falls_back() {
        let dir = temp_path("corrupt");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("progress.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.load().is_err());
        assert_eq!(load_or_default(&store), PlayerProgress::default());
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn sqlite_slot_roundtrip() {
        let pool = init_db("sqlite::memory:").await.unwrap();
        assert_eq!(load_progress(&pool, "default").await.unwrap(), None);
        save_progress(&pool, "default", &PlayerProgress::default()).await.unwrap();
        save_progress(&pool, "default", &sample()).await.unwrap();
        assert_eq!(load_progress(&pool, "default").await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn run_log_lists_newest_first() {
        let pool = init_db("sqlite::memory:").await.unwrap();
        for n in 1..=3u64 {
            let rec = RunRecord {
                run_number: n,
                generations: 10 * n,
                reason: "Stable".into(),
                currency_delta: -5 + n as i64,
                score: n,
                finished_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            };
            record_run(&pool, &rec).await.unwrap();
        }
        let runs = list_runs(&pool, 2).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_number, 3);
        assert_eq!(runs[1].currency_delta, -3);
        assert_eq!(runs[0].reason, "Stable");
    }

    proptest! {
        #[test]
        fn bincode_roundtrip_is_exact(
            currency in any::<u64>(),
            runs in any::<u64>(),
            lvl in 0u32..1000,
        ) {
            let mut p = PlayerProgress {
                currency,
                total_runs: runs,
                ..Default::default()
            };
            p.levels.insert(UpgradeId::Density, lvl);
            let bytes = encode_progress(&p).unwrap();
            prop_assert_eq!(decode_progress(&bytes).unwrap(), p);
        }
    }
}
