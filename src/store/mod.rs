//! Durable checkpoint and finding storage on SQLite
//!
//! The store holds only a path; every operation opens its own connection so
//! the scan loop and any number of readers can share one database file
//! through SQLite's own locking (WAL journal plus a busy timeout). All
//! methods are blocking; async callers go through [`Store::call`].

mod records;
mod schema;


pub use records::{FindingRow, Insertion, StoreStats};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use records::{decode_line_nums, encode_line_nums};
use rusqlite::{Connection, OptionalExtension, params};
use schema::CHECKPOINT_KEY;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint row 'last_check' is missing")]
    MissingCheckpoint,

    #[error("checkpoint value '{value}' is not a valid timestamp: {reason}")]
    CorruptCheckpoint { value: String, reason: String },

    #[error("finding {internal_id} has corrupt line numbers '{value}'")]
    CorruptLineNums { internal_id: i64, value: String },

    #[error("refusing to record {gist_id}/{file} without line numbers")]
    EmptyFinding { gist_id: String, file: String },

    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Stored state no longer satisfies the layout the scanner relies on
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            StoreError::MissingCheckpoint
                | StoreError::CorruptCheckpoint { .. }
                | StoreError::CorruptLineNums { .. }
        )
    }
}

/// Format used for the persisted checkpoint, e.g. `2024-05-01T12:00:00Z`
pub fn format_checkpoint(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_checkpoint(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptCheckpoint {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

type RawRow = (i64, String, String, String, String);

const FINDING_COLUMNS: &str = "SELECT f.internal_id, f.gist_id, g.html_url, f.file, f.line_nums
     FROM gist_files f INNER JOIN gists g ON g.gist_id = f.gist_id";

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    /// Open (creating if needed) the database and seed the checkpoint on first run.
    ///
    /// An existing checkpoint is never overwritten by `initial_checkpoint`.
    pub fn open<P: AsRef<Path>>(
        path: P,
        busy_timeout: Duration,
        initial_checkpoint: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let store = Self { path, busy_timeout };
        let conn = store.connect()?;
        schema::init_db(&conn)?;

        let initial = format_checkpoint(initial_checkpoint.trunc_subsecs(0));
        if schema::seed_checkpoint(&conn, &initial)? {
            tracing::info!("Initialised checkpoint to {} in {}", initial, store.path.display());
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    fn read_checkpoint(conn: &Connection) -> Result<DateTime<Utc>, StoreError> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![CHECKPOINT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(value) => parse_checkpoint(&value),
            None => Err(StoreError::MissingCheckpoint),
        }
    }

    pub fn get_checkpoint(&self) -> Result<DateTime<Utc>, StoreError> {
        let conn = self.connect()?;
        Self::read_checkpoint(&conn)
    }

    /// Move the checkpoint forward to `at`, truncated to whole seconds.
    ///
    /// Returns `false` and leaves the row untouched when `at` is not later
    /// than the stored value.
    pub fn set_checkpoint(&self, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let at = at.trunc_subsecs(0);
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let current = Self::read_checkpoint(&tx)?;
        if at <= current {
            tracing::debug!("Checkpoint stays at {} (candidate {})", current, at);
            return Ok(false);
        }

        tx.execute(
            "UPDATE config SET value = ?2 WHERE key = ?1",
            params![CHECKPOINT_KEY, format_checkpoint(at)],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Record a gist unless it is already known; returns whether a row was added
    pub fn upsert_gist(&self, gist_id: &str, html_url: &str) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        Ok(Self::insert_gist(&conn, gist_id, html_url)?)
    }

    fn insert_gist(conn: &Connection, gist_id: &str, html_url: &str) -> rusqlite::Result<bool> {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO gists (gist_id, html_url) VALUES (?1, ?2)",
            params![gist_id, html_url],
        )?;
        Ok(inserted == 1)
    }

    fn insert_file(
        conn: &Connection,
        gist_id: &str,
        file: &str,
        line_nums: &[usize],
    ) -> Result<Insertion, StoreError> {
        if line_nums.is_empty() {
            return Err(StoreError::EmptyFinding {
                gist_id: gist_id.to_string(),
                file: file.to_string(),
            });
        }

        let inserted = conn.execute(
            "INSERT INTO gist_files (gist_id, file, line_nums) VALUES (?1, ?2, ?3)
             ON CONFLICT (gist_id, file) DO NOTHING",
            params![gist_id, file, encode_line_nums(line_nums)],
        )?;
        if inserted == 1 {
            return Ok(Insertion::Inserted(conn.last_insert_rowid()));
        }

        let existing: i64 = conn.query_row(
            "SELECT internal_id FROM gist_files WHERE gist_id = ?1 AND file = ?2",
            params![gist_id, file],
            |row| row.get(0),
        )?;
        Ok(Insertion::Duplicate(existing))
    }

    /// Record one finding for an already stored gist
    pub fn insert_finding(
        &self,
        gist_id: &str,
        file: &str,
        line_nums: &[usize],
    ) -> Result<Insertion, StoreError> {
        let conn = self.connect()?;
        Self::insert_file(&conn, gist_id, file, line_nums)
    }

    /// Record the gist and its finding as one unit
    pub fn record_finding(
        &self,
        gist_id: &str,
        html_url: &str,
        file: &str,
        line_nums: &[usize],
    ) -> Result<Insertion, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        Self::insert_gist(&tx, gist_id, html_url)?;
        let insertion = Self::insert_file(&tx, gist_id, file, line_nums)?;
        tx.commit()?;
        Ok(insertion)
    }

    fn collect_rows(raw: Vec<RawRow>) -> Result<Vec<FindingRow>, StoreError> {
        raw.into_iter()
            .map(|(internal_id, gist_id, html_url, file, line_nums)| {
                Ok(FindingRow {
                    line_nums: decode_line_nums(internal_id, &line_nums)?,
                    internal_id,
                    gist_id,
                    html_url,
                    file,
                })
            })
            .collect()
    }

    fn query_rows(&self, sql: &str, bind: impl rusqlite::Params) -> Result<Vec<FindingRow>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let raw = stmt
            .query_map(bind, |row| -> rusqlite::Result<RawRow> {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<rusqlite::Result<Vec<RawRow>>>()?;
        Self::collect_rows(raw)
    }

    /// The `n` most recent findings, newest first
    pub fn query_latest(&self, n: u32) -> Result<Vec<FindingRow>, StoreError> {
        self.query_rows(
            &format!("{FINDING_COLUMNS} ORDER BY f.internal_id DESC LIMIT ?1"),
            params![n],
        )
    }

    /// Findings with `lo <= internal_id <= hi`, oldest first; empty when `lo > hi`
    pub fn query_range(&self, lo: i64, hi: i64) -> Result<Vec<FindingRow>, StoreError> {
        self.query_rows(
            &format!("{FINDING_COLUMNS} WHERE f.internal_id BETWEEN ?1 AND ?2 ORDER BY f.internal_id ASC"),
            params![lo, hi],
        )
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.connect()?;
        let gists: i64 = conn.query_row("SELECT COUNT(*) FROM gists", [], |r| r.get(0))?;
        let (findings, max_internal_id): (i64, Option<i64>) = conn.query_row(
            "SELECT COUNT(*), MAX(internal_id) FROM gist_files",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        let checkpoint = match Self::read_checkpoint(&conn) {
            Ok(at) => Some(at),
            Err(StoreError::MissingCheckpoint) => None,
            Err(e) => return Err(e),
        };

        Ok(StoreStats {
            gists: gists.max(0) as u64,
            findings: findings.max(0) as u64,
            max_internal_id,
            checkpoint,
        })
    }

    /// Run blocking store work off the async runtime
    pub async fn call<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
