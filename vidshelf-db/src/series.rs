//! Per-series playback preferences, keyed by series prefix + suffix.
//!
//! The prefix identifies show and season, the suffix the release/encoding.
//! Both are computed by the caller from the filename and are opaque here.

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};

use crate::error::{Result, StoreError};
use crate::playback::PlaybackSession;
use crate::timecode::format_mmss;

/// Autoplay and intro/outro skipping for one version of a series.
///
/// Times are seconds; `None` means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesSettings {
    pub autoplay: bool,
    pub skip_intro: bool,
    pub skip_outro: bool,
    pub intro_start: Option<u32>,
    pub intro_end: Option<u32>,
    pub credits_duration: Option<u32>,
}

impl SeriesSettings {
    /// Check that the intro ends after it starts when both bounds are set.
    ///
    /// The store does not call this itself; editors should run it before
    /// saving.
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.intro_start, self.intro_end) {
            if end <= start {
                return Err(StoreError::validation(
                    "intro_end",
                    format!(
                        "{} must be after intro_start ({})",
                        format_mmss(end),
                        format_mmss(start)
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl PlaybackSession<'_> {
    /// Insert or overwrite the settings for `prefix` + `suffix`.
    pub fn save_series_settings(
        &self,
        prefix: &str,
        suffix: &str,
        settings: &SeriesSettings,
    ) -> Result<()> {
        write_settings(&self.conn, prefix, suffix, settings)
    }

    pub fn get_series_settings(&self, prefix: &str, suffix: &str) -> Result<Option<SeriesSettings>> {
        read_settings(&self.conn, prefix, suffix)
    }

    /// Other suffixes seen with `prefix`, in playback history or settings,
    /// excluding `excluding_suffix`. Sorted and distinct.
    pub fn find_other_versions(&self, prefix: &str, excluding_suffix: &str) -> Result<Vec<String>> {
        other_versions(&self.conn, prefix, excluding_suffix)
    }

    /// Copy the settings of `prefix` + `source_suffix` onto every other
    /// version of the series. Returns the number of versions written, or 0
    /// when the source has no settings.
    pub fn propagate_series_settings(&self, prefix: &str, source_suffix: &str) -> Result<usize> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let Some(settings) = read_settings(&tx, prefix, source_suffix)? else {
            return Ok(0);
        };
        let targets = other_versions(&tx, prefix, source_suffix)?;
        for suffix in &targets {
            write_settings(&tx, prefix, suffix, &settings)?;
        }
        tx.commit()?;

        log::debug!(
            "Propagated settings of {}/{} to {} other version(s)",
            prefix,
            source_suffix,
            targets.len(),
        );
        Ok(targets.len())
    }
}

fn write_settings(
    conn: &Connection,
    prefix: &str,
    suffix: &str,
    settings: &SeriesSettings,
) -> Result<()> {
    conn.execute(
        "INSERT INTO series_settings (series_prefix, series_suffix, autoplay, skip_intro,
             skip_outro, intro_start, intro_end, credits_duration)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(series_prefix, series_suffix) DO UPDATE SET
             autoplay = excluded.autoplay,
             skip_intro = excluded.skip_intro,
             skip_outro = excluded.skip_outro,
             intro_start = excluded.intro_start,
             intro_end = excluded.intro_end,
             credits_duration = excluded.credits_duration",
        params![
            prefix,
            suffix,
            i32::from(settings.autoplay),
            i32::from(settings.skip_intro),
            i32::from(settings.skip_outro),
            settings.intro_start.map(|s| s.to_string()),
            settings.intro_end.map(|s| s.to_string()),
            settings.credits_duration.map(|s| s.to_string()),
        ],
    )?;
    Ok(())
}

fn read_settings(conn: &Connection, prefix: &str, suffix: &str) -> Result<Option<SeriesSettings>> {
    let mut stmt = conn.prepare_cached(
        "SELECT autoplay, skip_intro, skip_outro, intro_start, intro_end, credits_duration
         FROM series_settings WHERE series_prefix = ?1 AND series_suffix = ?2",
    )?;
    let settings = stmt
        .query_row(params![prefix, suffix], |row| {
            Ok(SeriesSettings {
                autoplay: row.get::<_, i64>(0)? != 0,
                skip_intro: row.get::<_, i64>(1)? != 0,
                skip_outro: row.get::<_, i64>(2)? != 0,
                intro_start: parse_seconds(row.get(3)?),
                intro_end: parse_seconds(row.get(4)?),
                credits_duration: parse_seconds(row.get(5)?),
            })
        })
        .optional()?;
    Ok(settings)
}

fn other_versions(conn: &Connection, prefix: &str, excluding_suffix: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT series_suffix FROM playback
         WHERE series_prefix = ?1 AND series_suffix IS NOT NULL AND series_suffix != ?2
         UNION
         SELECT series_suffix FROM series_settings
         WHERE series_prefix = ?1 AND series_suffix != ?2
         ORDER BY 1",
    )?;
    let rows = stmt.query_map(params![prefix, excluding_suffix], |row| row.get(0))?;
    rows.collect::<rusqlite::Result<Vec<String>>>().map_err(Into::into)
}

/// Stored times are text; anything that is not a whole number of seconds
/// reads back as unset.
fn parse_seconds(raw: Option<String>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse().ok())
}
