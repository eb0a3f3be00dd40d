//! vidshelf CLI
//!
//! Command-line access to the playback, series and configuration data shared
//! by the video menus.

mod cli_types;
mod commands;
mod error;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use vidshelf_db::{Settings, Stores};

use cli_types::{Cli, Commands, ConfigAction, PlaybackAction, SeriesAction};
pub(crate) use error::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::load();
    let db_path = settings.resolve_database_path(cli.db);

    // `config path` must work even when the database cannot be opened.
    if matches!(
        cli.command,
        Commands::Config {
            action: ConfigAction::Path
        }
    ) {
        commands::config::run_config_path(&db_path);
        return Ok(());
    }

    let stores = open(&db_path, &settings)?;

    match cli.command {
        Commands::Init => commands::init::run_init(&stores),
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => commands::config::run_config_get(&stores, &key),
            ConfigAction::Set {
                key,
                value,
                config_type,
                category,
                description,
                keep_existing,
            } => commands::config::run_config_set(
                &stores,
                &key,
                &value,
                config_type,
                category,
                description.as_deref().unwrap_or_default(),
                keep_existing,
            ),
            ConfigAction::List { category } => commands::config::run_config_list(&stores, category),
            ConfigAction::Delete { key } => commands::config::run_config_delete(&stores, &key),
            ConfigAction::Export { file } => commands::config::run_config_export(&stores, &file),
            ConfigAction::Import {
                file,
                keep_existing,
            } => commands::config::run_config_import(&stores, &file, keep_existing),
            ConfigAction::Path => {
                commands::config::run_config_path(&db_path);
                Ok(())
            }
        },
        Commands::Playback { action } => match action {
            PlaybackAction::Show { file } => commands::playback::run_playback_show(&stores, &file),
            PlaybackAction::Save {
                file,
                position,
                duration,
                series,
                percent,
            } => commands::playback::run_playback_save(
                &stores, &file, position, duration, series, percent,
            ),
            PlaybackAction::Forget { file } => {
                commands::playback::run_playback_forget(&stores, &file)
            }
            PlaybackAction::Status { dir } => commands::playback::run_playback_status(&stores, dir),
        },
        Commands::Series { action } => match action {
            SeriesAction::Show { prefix, suffix } => {
                commands::series::run_series_show(&stores, &prefix, &suffix)
            }
            SeriesAction::Set {
                prefix,
                suffix,
                edits,
            } => commands::series::run_series_set(&stores, &prefix, &suffix, &edits),
            SeriesAction::Versions { prefix, suffix } => {
                commands::series::run_series_versions(&stores, &prefix, &suffix)
            }
            SeriesAction::Propagate { prefix, suffix } => {
                commands::series::run_series_propagate(&stores, &prefix, &suffix)
            }
        },
    }
}

fn open(db_path: &Path, settings: &Settings) -> Result<Stores, CliError> {
    log::debug!("Using database {}", db_path.display());
    Ok(vidshelf_db::open_stores(
        db_path,
        settings.database.pool_config(),
    )?)
}

/// Install the global logger.
///
/// Normal output goes through `log::info!` with no decoration so commands can
/// print with the logging macros. `--verbose` adds timestamps and targets;
/// `RUST_LOG` overrides the level either way.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout);

    if verbose {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        });
    } else {
        builder.format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{}: {}", level.as_str().to_lowercase(), record.args()),
        });
    }

    builder.init();
}

/// Emit an empty line through the logger.
pub(crate) fn log_blank() {
    log::info!("");
}
