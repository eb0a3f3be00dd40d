//! Playback progress: resume positions and watched/partial classification.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::error::{Result, StoreError};
use crate::pool::{ConnectionPool, PooledConnection};
use crate::schema::create_playback_schema;

/// Filenames per `IN (...)` query. Stays under SQLite's historical
/// bound-parameter limit.
const MAX_BATCH_PARAMS: usize = 999;

/// Percent at which a file counts as watched.
const WATCHED_PERCENT: u8 = 90;

/// Position, duration and percent-complete as reported by the player.
///
/// The percent is owned by the caller and stored as given; use
/// [`Progress::from_position`] for the canonical rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub position: u32,
    pub duration: u32,
    pub percent: u8,
}

impl Progress {
    pub fn new(position: u32, duration: u32, percent: u8) -> Self {
        Self {
            position,
            duration,
            percent,
        }
    }

    /// Derive percent as `round(position / duration * 100)`, capped at 100.
    /// A zero duration yields 0%.
    pub fn from_position(position: u32, duration: u32) -> Self {
        let percent = if duration == 0 {
            0
        } else {
            (f64::from(position) / f64::from(duration) * 100.0)
                .round()
                .min(100.0) as u8
        };
        Self::new(position, duration, percent)
    }
}

/// A stored playback row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRecord {
    pub filename: String,
    pub position: u32,
    pub duration: u32,
    pub percent: u8,
    pub series_prefix: Option<String>,
    pub series_suffix: Option<String>,
    pub modified_at: String,
}

impl PlaybackRecord {
    pub fn progress(&self) -> Progress {
        Progress::new(self.position, self.duration, self.percent)
    }
}

/// Viewing state derived from percent-complete. Not-started files have no
/// status at all, so lookups return `Option<PlaybackStatus>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackStatus {
    /// 1-89%
    Partial,
    /// 90-100%
    Watched,
}

impl PlaybackStatus {
    pub fn from_percent(percent: u8) -> Option<Self> {
        match percent {
            0 => None,
            p if p < WATCHED_PERCENT => Some(Self::Partial),
            _ => Some(Self::Watched),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partial => "partial",
            Self::Watched => "watched",
        }
    }

    /// Directory-listing label: `"watched"`, `"partial"`, or `""`.
    pub fn label(status: Option<Self>) -> &'static str {
        status.map_or("", |s| s.as_str())
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback and series-settings storage backed by a shared pool.
#[derive(Debug, Clone)]
pub struct PlaybackStore {
    pool: Arc<ConnectionPool>,
}

impl PlaybackStore {
    /// Create the playback and series tables if needed.
    pub fn new(pool: Arc<ConnectionPool>) -> Result<Self> {
        {
            let conn = pool.acquire()?;
            create_playback_schema(&conn)?;
        }
        Ok(Self { pool })
    }

    /// Check out a connection for a batch of operations. It goes back to the
    /// pool when the session is dropped.
    pub fn session(&self) -> Result<PlaybackSession<'_>> {
        Ok(PlaybackSession {
            conn: self.pool.acquire()?,
        })
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}

/// Scoped access to the playback tables through one pooled connection.
#[derive(Debug)]
pub struct PlaybackSession<'p> {
    pub(crate) conn: PooledConnection<'p>,
}

impl PlaybackSession<'_> {
    /// Insert or overwrite the playback row for `filename`.
    pub fn save_playback(
        &self,
        filename: &str,
        progress: Progress,
        series_prefix: Option<&str>,
        series_suffix: Option<&str>,
    ) -> Result<()> {
        if filename.is_empty() {
            return Err(StoreError::validation("filename", "must not be empty"));
        }
        if progress.percent > 100 {
            return Err(StoreError::validation(
                "percent",
                format!("{} is outside 0-100", progress.percent),
            ));
        }

        self.conn.execute(
            "INSERT INTO playback (filename, position, duration, percent,
                 series_prefix, series_suffix, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
             ON CONFLICT(filename) DO UPDATE SET
                 position = excluded.position,
                 duration = excluded.duration,
                 percent = excluded.percent,
                 series_prefix = excluded.series_prefix,
                 series_suffix = excluded.series_suffix,
                 modified_at = excluded.modified_at",
            params![
                filename,
                progress.position,
                progress.duration,
                progress.percent,
                series_prefix,
                series_suffix,
            ],
        )?;
        Ok(())
    }

    pub fn get_playback(&self, filename: &str) -> Result<Option<PlaybackRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT filename, position, duration, percent, series_prefix,
                    series_suffix, modified_at
             FROM playback WHERE filename = ?1",
        )?;
        let record = stmt
            .query_row(params![filename], |row| {
                Ok(PlaybackRecord {
                    filename: row.get(0)?,
                    position: row.get(1)?,
                    duration: row.get(2)?,
                    percent: row.get(3)?,
                    series_prefix: row.get(4)?,
                    series_suffix: row.get(5)?,
                    modified_at: row.get(6)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    pub fn get_playback_percent(&self, filename: &str) -> Result<Option<u8>> {
        Ok(self.get_playback(filename)?.map(|r| r.percent))
    }

    /// `None` both for unknown files and for files saved at 0%.
    pub fn get_playback_status(&self, filename: &str) -> Result<Option<PlaybackStatus>> {
        Ok(self
            .get_playback_percent(filename)?
            .and_then(PlaybackStatus::from_percent))
    }

    /// Look up the status of every file in a directory listing at once.
    ///
    /// The result has one entry per distinct requested filename; files with
    /// no row (or 0%) map to `None`. `directory` is only used for logging,
    /// rows are keyed by bare filename.
    pub fn get_playback_batch_status<S: AsRef<str>>(
        &self,
        directory: &str,
        filenames: &[S],
    ) -> Result<HashMap<String, Option<PlaybackStatus>>> {
        let mut distinct: Vec<&str> = filenames.iter().map(AsRef::as_ref).collect();
        distinct.sort_unstable();
        distinct.dedup();

        let mut statuses = HashMap::with_capacity(distinct.len());
        for chunk in distinct.chunks(MAX_BATCH_PARAMS) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = self.conn.prepare(&format!(
                "SELECT filename, percent FROM playback WHERE filename IN ({placeholders})"
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u8>(1)?))
            })?;
            for row in rows {
                let (filename, percent) = row?;
                statuses.insert(filename, PlaybackStatus::from_percent(percent));
            }
        }
        for filename in &distinct {
            statuses.entry((*filename).to_string()).or_insert(None);
        }

        log::debug!(
            "Batch status: {} files in '{}', {} with progress",
            distinct.len(),
            directory,
            statuses.values().filter(|s| s.is_some()).count(),
        );
        Ok(statuses)
    }

    /// Remove the playback row for `filename`. Returns false if none existed.
    pub fn delete_playback(&self, filename: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM playback WHERE filename = ?1", params![filename])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_percent_has_no_status() {
        assert_eq!(PlaybackStatus::from_percent(0), None);
    }

    #[test]
    fn partial_range() {
        for p in 1..=89 {
            assert_eq!(PlaybackStatus::from_percent(p), Some(PlaybackStatus::Partial), "{p}%");
        }
    }

    #[test]
    fn watched_range() {
        for p in 90..=100 {
            assert_eq!(PlaybackStatus::from_percent(p), Some(PlaybackStatus::Watched), "{p}%");
        }
    }

    #[test]
    fn labels() {
        assert_eq!(PlaybackStatus::label(None), "");
        assert_eq!(PlaybackStatus::label(Some(PlaybackStatus::Partial)), "partial");
        assert_eq!(PlaybackStatus::label(Some(PlaybackStatus::Watched)), "watched");
    }

    #[test]
    fn progress_rounds_percent() {
        assert_eq!(Progress::from_position(150, 600).percent, 25);
        assert_eq!(Progress::from_position(1, 3).percent, 33);
        assert_eq!(Progress::from_position(2, 3).percent, 67);
        assert_eq!(Progress::from_position(600, 600).percent, 100);
    }

    #[test]
    fn progress_handles_degenerate_durations() {
        assert_eq!(Progress::from_position(10, 0).percent, 0);
        assert_eq!(Progress::from_position(700, 600).percent, 100);
    }
}
