//! SQLite schema creation.
//!
//! Playback/series tables and the config table live in the same file but are
//! created by their own store, so either store can be used alone.

use rusqlite::Connection;

use crate::error::Result;

/// Names of the indexes backing the store's lookups.
pub const INDEXES: [&str; 3] = [
    "idx_playback_filename",
    "idx_playback_series_prefix",
    "idx_series_settings_prefix_suffix",
];

/// Create the playback and series tables and their indexes if missing.
///
/// Idempotent; safe to call on an existing database.
pub fn create_playback_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(PLAYBACK_SQL)?;
    Ok(())
}

/// Create the config table if missing.
pub fn create_config_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CONFIG_SQL)?;
    Ok(())
}

/// Create every table the crate uses.
pub fn create_schema(conn: &Connection) -> Result<()> {
    create_playback_schema(conn)?;
    create_config_schema(conn)
}

const PLAYBACK_SQL: &str = r#"
-- Resume position per file
CREATE TABLE IF NOT EXISTS playback (
    filename TEXT PRIMARY KEY,
    position INTEGER NOT NULL DEFAULT 0,
    duration INTEGER NOT NULL DEFAULT 0,
    percent INTEGER NOT NULL DEFAULT 0,
    series_prefix TEXT,
    series_suffix TEXT,
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_playback_filename ON playback(filename);
CREATE INDEX IF NOT EXISTS idx_playback_series_prefix ON playback(series_prefix);

-- Per-series playback preferences
CREATE TABLE IF NOT EXISTS series_settings (
    series_prefix TEXT NOT NULL,
    series_suffix TEXT NOT NULL,
    autoplay INTEGER NOT NULL DEFAULT 0,
    skip_intro INTEGER NOT NULL DEFAULT 0,
    skip_outro INTEGER NOT NULL DEFAULT 0,
    intro_start TEXT,
    intro_end TEXT,
    credits_duration TEXT,
    PRIMARY KEY (series_prefix, series_suffix)
);
CREATE INDEX IF NOT EXISTS idx_series_settings_prefix_suffix
    ON series_settings(series_prefix, series_suffix);
"#;

const CONFIG_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS config (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    type TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    modified_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
