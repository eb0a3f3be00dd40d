use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use vidshelf_db::{ConfigValue, PlaybackStatus, Progress, Stores, format_mmss};

use crate::CliError;
use crate::cli_types::SeriesKeyArgs;

const DEFAULT_VIDEO_EXTENSIONS: &str = "avi,mp4,mkv,mov,wmv,flv";

pub(crate) fn run_playback_show(stores: &Stores, file: &str) -> Result<(), CliError> {
    let record = stores
        .playback
        .session()?
        .get_playback(file)?
        .ok_or_else(|| CliError::not_found(format!("no playback recorded for '{}'", file)))?;

    let status = PlaybackStatus::from_percent(record.percent);
    log::info!("{}", record.filename.if_supports_color(Stdout, |t| t.bold()));
    log::info!(
        "  Position: {} / {} ({}%)",
        format_mmss(record.position),
        format_mmss(record.duration),
        record.percent,
    );
    log::info!("  Status:   {}", status_marker(status));
    if let (Some(prefix), Some(suffix)) = (&record.series_prefix, &record.series_suffix) {
        log::info!("  Series:   {} / {}", prefix, suffix);
    }
    log::info!(
        "  Updated:  {}",
        record.modified_at.if_supports_color(Stdout, |t| t.dimmed()),
    );
    Ok(())
}

pub(crate) fn run_playback_save(
    stores: &Stores,
    file: &str,
    position: u32,
    duration: u32,
    series: SeriesKeyArgs,
    percent: Option<u8>,
) -> Result<(), CliError> {
    let progress = match percent {
        Some(percent) => Progress::new(position, duration, percent),
        None => Progress::from_position(position, duration),
    };
    if series.prefix.is_some() != series.suffix.is_some() {
        log::warn!("Only one of --prefix/--suffix given; other versions will not find this file");
    }

    stores.playback.session()?.save_playback(
        file,
        progress,
        series.prefix.as_deref(),
        series.suffix.as_deref(),
    )?;
    log::info!(
        "{} {} at {} ({}%)",
        "Saved".if_supports_color(Stdout, |t| t.green()),
        file,
        format_mmss(progress.position),
        progress.percent,
    );
    Ok(())
}

pub(crate) fn run_playback_forget(stores: &Stores, file: &str) -> Result<(), CliError> {
    if stores.playback.session()?.delete_playback(file)? {
        log::info!("Forgot {}", file);
    } else {
        log::warn!("No playback recorded for '{}'", file);
    }
    Ok(())
}

/// List the video files of a directory with their watched markers.
pub(crate) fn run_playback_status(stores: &Stores, dir: Option<PathBuf>) -> Result<(), CliError> {
    let (dir, extensions) = {
        let config = stores.config.session()?;
        let dir = match dir {
            Some(dir) => dir,
            None => match config.get("media_dir")? {
                Some(ConfigValue::Path(p)) => p,
                Some(other) => PathBuf::from(other.to_string()),
                None => return Err(CliError::usage("no directory given and media_dir is not set")),
            },
        };
        let extensions = config
            .get_or(
                "video_extensions",
                ConfigValue::String(DEFAULT_VIDEO_EXTENSIONS.to_string()),
            )?
            .to_string();
        (dir, parse_extensions(&extensions))
    };

    if !dir.is_dir() {
        return Err(CliError::usage(format!("{} is not a directory", dir.display())));
    }

    let mut files: Vec<String> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_video(path, &extensions))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    files.sort();

    log::info!("{}", dir.display().if_supports_color(Stdout, |t| t.bold()));
    if files.is_empty() {
        log::info!("  No video files");
        return Ok(());
    }

    let statuses = stores
        .playback
        .session()?
        .get_playback_batch_status(&dir.to_string_lossy(), &files)?;
    for file in &files {
        let status = statuses.get(file).copied().flatten();
        log::info!("  {} {}", status_marker(status), file);
        log::debug!("    {} is {}", file, status_label(status));
    }
    Ok(())
}

fn status_marker(status: Option<PlaybackStatus>) -> String {
    match status {
        Some(PlaybackStatus::Watched) => "[X]".if_supports_color(Stdout, |t| t.green()).to_string(),
        Some(PlaybackStatus::Partial) => "[T]".if_supports_color(Stdout, |t| t.yellow()).to_string(),
        None => "[ ]".to_string(),
    }
}

fn status_label(status: Option<PlaybackStatus>) -> &'static str {
    match PlaybackStatus::label(status) {
        "" => "unwatched",
        label => label,
    }
}

/// Split the comma-separated `video_extensions` value into lowercase
/// extensions without dots.
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn is_video(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}
