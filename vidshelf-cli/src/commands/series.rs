use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use vidshelf_db::{SeriesSettings, Stores, format_mmss};

use crate::CliError;
use crate::cli_types::SeriesEdits;

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn time_or_unset(seconds: Option<u32>) -> String {
    seconds.map_or_else(|| "--:--".to_string(), format_mmss)
}

pub(crate) fn run_series_show(stores: &Stores, prefix: &str, suffix: &str) -> Result<(), CliError> {
    let settings = stores
        .playback
        .session()?
        .get_series_settings(prefix, suffix)?
        .ok_or_else(|| CliError::not_found(format!("no settings for {} / {}", prefix, suffix)))?;

    log::info!(
        "{}",
        format!("{} / {}", prefix, suffix).if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("  Autoplay:    {}", yes_no(settings.autoplay));
    log::info!(
        "  Skip intro:  {} ({} - {})",
        yes_no(settings.skip_intro),
        time_or_unset(settings.intro_start),
        time_or_unset(settings.intro_end),
    );
    log::info!(
        "  Skip outro:  {} (credits {})",
        yes_no(settings.skip_outro),
        time_or_unset(settings.credits_duration),
    );
    Ok(())
}

impl SeriesEdits {
    /// Overlay the fields that were given onto `settings`.
    fn apply(&self, settings: SeriesSettings) -> SeriesSettings {
        SeriesSettings {
            autoplay: self.autoplay.unwrap_or(settings.autoplay),
            skip_intro: self.skip_intro.unwrap_or(settings.skip_intro),
            skip_outro: self.skip_outro.unwrap_or(settings.skip_outro),
            intro_start: self.intro_start.or(settings.intro_start),
            intro_end: self.intro_end.or(settings.intro_end),
            credits_duration: self.credits.or(settings.credits_duration),
        }
    }
}

pub(crate) fn run_series_set(
    stores: &Stores,
    prefix: &str,
    suffix: &str,
    edits: &SeriesEdits,
) -> Result<(), CliError> {
    let session = stores.playback.session()?;
    let stored = session.get_series_settings(prefix, suffix)?;
    if stored.is_none() {
        log::debug!("No settings yet for {} / {}, starting from defaults", prefix, suffix);
    }

    let settings = edits.apply(stored.unwrap_or_default());
    settings.validate()?;
    if settings.skip_intro && settings.intro_end.is_none() {
        log::warn!("--skip-intro without --intro-end has nothing to skip");
    }

    session.save_series_settings(prefix, suffix, &settings)?;
    log::info!(
        "{} settings for {} / {}",
        "Saved".if_supports_color(Stdout, |t| t.green()),
        prefix,
        suffix,
    );
    Ok(())
}

pub(crate) fn run_series_versions(
    stores: &Stores,
    prefix: &str,
    suffix: &str,
) -> Result<(), CliError> {
    let versions = stores.playback.session()?.find_other_versions(prefix, suffix)?;
    if versions.is_empty() {
        log::info!("No other versions of {}", prefix);
        return Ok(());
    }
    for version in &versions {
        log::info!("  {}", version);
    }
    Ok(())
}

pub(crate) fn run_series_propagate(
    stores: &Stores,
    prefix: &str,
    suffix: &str,
) -> Result<(), CliError> {
    let written = stores
        .playback
        .session()?
        .propagate_series_settings(prefix, suffix)?;
    if written == 0 {
        log::warn!(
            "Nothing copied: {} / {} has no settings or no other versions",
            prefix,
            suffix
        );
    } else {
        log::info!(
            "Copied settings of {} / {} to {} other version(s)",
            prefix,
            suffix,
            written.if_supports_color(Stdout, |t| t.green()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidshelf_db::{PoolConfig, open_stores};

    fn temp_stores() -> (tempfile::TempDir, Stores) {
        let dir = tempfile::tempdir().unwrap();
        let stores = open_stores(&dir.path().join("series.db"), PoolConfig::default()).unwrap();
        (dir, stores)
    }

    fn stored(stores: &Stores) -> Option<SeriesSettings> {
        stores
            .playback
            .session()
            .unwrap()
            .get_series_settings("Show.S01", "1080p")
            .unwrap()
    }

    #[test]
    fn set_keeps_fields_not_given() {
        let (_dir, stores) = temp_stores();
        let before = SeriesSettings {
            skip_intro: true,
            intro_start: Some(30),
            intro_end: Some(90),
            ..SeriesSettings::default()
        };
        stores
            .playback
            .session()
            .unwrap()
            .save_series_settings("Show.S01", "1080p", &before)
            .unwrap();

        let edits = SeriesEdits {
            autoplay: Some(true),
            ..SeriesEdits::default()
        };
        run_series_set(&stores, "Show.S01", "1080p", &edits).unwrap();

        assert_eq!(
            stored(&stores),
            Some(SeriesSettings {
                autoplay: true,
                ..before
            })
        );
    }

    #[test]
    fn set_can_turn_a_flag_off() {
        let (_dir, stores) = temp_stores();
        let on = SeriesEdits {
            skip_intro: Some(true),
            intro_start: Some(10),
            intro_end: Some(70),
            ..SeriesEdits::default()
        };
        run_series_set(&stores, "Show.S01", "1080p", &on).unwrap();

        let off = SeriesEdits {
            skip_intro: Some(false),
            ..SeriesEdits::default()
        };
        run_series_set(&stores, "Show.S01", "1080p", &off).unwrap();

        let settings = stored(&stores).unwrap();
        assert!(!settings.skip_intro);
        assert_eq!((settings.intro_start, settings.intro_end), (Some(10), Some(70)));
    }

    #[test]
    fn set_starts_from_defaults() {
        let (_dir, stores) = temp_stores();
        let edits = SeriesEdits {
            credits: Some(95),
            ..SeriesEdits::default()
        };
        run_series_set(&stores, "Show.S01", "1080p", &edits).unwrap();

        assert_eq!(
            stored(&stores),
            Some(SeriesSettings {
                credits_duration: Some(95),
                ..SeriesSettings::default()
            })
        );
    }

    #[test]
    fn merged_times_are_validated() {
        let (_dir, stores) = temp_stores();
        let first = SeriesEdits {
            intro_start: Some(30),
            intro_end: Some(90),
            ..SeriesEdits::default()
        };
        run_series_set(&stores, "Show.S01", "1080p", &first).unwrap();

        let late_start = SeriesEdits {
            intro_start: Some(120),
            ..SeriesEdits::default()
        };
        assert!(run_series_set(&stores, "Show.S01", "1080p", &late_start).is_err());
        assert_eq!(stored(&stores).unwrap().intro_start, Some(30));
    }
}
