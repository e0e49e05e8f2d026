//! Table layout and first-run seeding

use rusqlite::{Connection, params};

pub(crate) const CHECKPOINT_KEY: &str = "last_check";

/// `gist_files.internal_id` uses AUTOINCREMENT so ids are never handed out
/// twice, even after the highest row is removed.
const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS config (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS gists (
        gist_id TEXT PRIMARY KEY,
        html_url TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS gist_files (
        internal_id INTEGER PRIMARY KEY AUTOINCREMENT,
        gist_id TEXT NOT NULL REFERENCES gists(gist_id),
        file TEXT NOT NULL,
        line_nums TEXT NOT NULL,
        UNIQUE (gist_id, file)
    );
    CREATE INDEX IF NOT EXISTS idx_gist_files_gist ON gist_files(gist_id);
"#;

pub(crate) fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Insert the checkpoint row unless one already exists
pub(crate) fn seed_checkpoint(conn: &Connection, value: &str) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO config (key, value) VALUES (?1, ?2)",
        params![CHECKPOINT_KEY, value],
    )?;
    Ok(inserted == 1)
}
