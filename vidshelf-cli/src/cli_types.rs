//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use vidshelf_db::{ConfigCategory, ConfigType};

#[derive(Parser)]
#[command(name = "vidshelf")]
#[command(about = "Inspect and edit the video menu database", long_about = None)]
pub(crate) struct Cli {
    /// Database file (defaults to settings.toml, then the user data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create the database, its tables and the default configuration
    Init,

    /// Read and edit configuration entries
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect and edit playback progress
    Playback {
        #[command(subcommand)]
        action: PlaybackAction,
    },

    /// Inspect and edit per-series settings
    Series {
        #[command(subcommand)]
        action: SeriesAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show the value of one key
    Get { key: String },

    /// Set a key
    Set {
        key: String,
        value: String,

        /// string, int, bool or path
        #[arg(value_parser = parse_config_type)]
        config_type: ConfigType,

        /// general, cec, media or ui
        #[arg(value_parser = parse_config_category)]
        category: ConfigCategory,

        description: Option<String>,

        /// Leave the key alone if it already exists
        #[arg(long)]
        keep_existing: bool,
    },

    /// List entries, optionally for one category
    List {
        #[arg(value_parser = parse_config_category)]
        category: Option<ConfigCategory>,
    },

    /// Remove a key
    Delete { key: String },

    /// Write every entry to a JSON file
    Export { file: PathBuf },

    /// Load entries from a JSON file written by `export`
    Import {
        file: PathBuf,

        /// Only add keys that do not exist yet
        #[arg(long)]
        keep_existing: bool,
    },

    /// Print the database and settings file paths
    Path,
}

#[derive(Subcommand)]
pub(crate) enum PlaybackAction {
    /// Show the stored progress of a file
    Show { file: String },

    /// Record progress for a file
    Save {
        file: String,

        /// Position in seconds
        position: u32,

        /// Duration in seconds
        duration: u32,

        #[command(flatten)]
        series: SeriesKeyArgs,

        /// Percent watched (computed from position and duration if omitted)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: Option<u8>,
    },

    /// Remove the stored progress of a file
    Forget { file: String },

    /// List video files in a directory with their watched state
    Status {
        /// Directory to list (defaults to the `media_dir` config entry)
        dir: Option<PathBuf>,
    },
}

/// Optional series identity of a playback record.
#[derive(Args, Clone, Default)]
pub(crate) struct SeriesKeyArgs {
    /// Series prefix (show and season)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Series suffix (release or encoding)
    #[arg(long)]
    pub suffix: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum SeriesAction {
    /// Show settings for one version of a series
    Show { prefix: String, suffix: String },

    /// Change settings for one version of a series
    Set {
        prefix: String,
        suffix: String,

        #[command(flatten)]
        edits: SeriesEdits,
    },

    /// List other versions of a series
    Versions { prefix: String, suffix: String },

    /// Copy settings of one version to all other versions
    Propagate { prefix: String, suffix: String },
}

/// Fields of `series set`. Anything not given keeps its stored value.
#[derive(Args, Debug, Default)]
pub(crate) struct SeriesEdits {
    /// Play the next episode automatically (`--autoplay false` turns it off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    pub autoplay: Option<bool>,

    /// Skip the intro
    #[arg(long, num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    pub skip_intro: Option<bool>,

    /// Skip the outro/credits
    #[arg(long, num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    pub skip_outro: Option<bool>,

    /// Intro start (MM:SS)
    #[arg(long, value_parser = parse_timecode)]
    pub intro_start: Option<u32>,

    /// Intro end (MM:SS)
    #[arg(long, value_parser = parse_timecode)]
    pub intro_end: Option<u32>,

    /// Credits length (MM:SS)
    #[arg(long, value_parser = parse_timecode)]
    pub credits: Option<u32>,
}

fn parse_config_type(s: &str) -> Result<ConfigType, String> {
    s.parse().map_err(|e: vidshelf_db::StoreError| e.to_string())
}

fn parse_config_category(s: &str) -> Result<ConfigCategory, String> {
    s.parse().map_err(|e: vidshelf_db::StoreError| e.to_string())
}

fn parse_timecode(s: &str) -> Result<u32, String> {
    vidshelf_db::parse_mmss(s).ok_or_else(|| format!("'{s}' is not a MM:SS time"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vidshelf", "init", "--db", "/tmp/x.db", "-v"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert!(matches!(cli.command, Commands::Init));
    }

    #[test]
    fn config_set_parses_type_and_category() {
        let cli = Cli::try_parse_from([
            "vidshelf", "config", "set", "menu_height", "25", "int", "ui", "--keep-existing",
        ])
        .unwrap();
        match cli.command {
            Commands::Config {
                action:
                    ConfigAction::Set {
                        key,
                        value,
                        config_type,
                        category,
                        description,
                        keep_existing,
                    },
            } => {
                assert_eq!(key, "menu_height");
                assert_eq!(value, "25");
                assert_eq!(config_type, ConfigType::Int);
                assert_eq!(category, ConfigCategory::Ui);
                assert_eq!(description, None);
                assert!(keep_existing);
            }
            _ => panic!("expected config set"),
        }
    }

    #[test]
    fn config_set_rejects_unknown_type() {
        assert!(
            Cli::try_parse_from(["vidshelf", "config", "set", "k", "v", "float", "ui"]).is_err()
        );
    }

    #[test]
    fn playback_save_bounds_percent() {
        assert!(
            Cli::try_parse_from(["vidshelf", "playback", "save", "a.mkv", "1", "2", "--percent", "101"])
                .is_err()
        );
        let cli = Cli::try_parse_from([
            "vidshelf", "playback", "save", "a.mkv", "150", "600", "--prefix", "Show.S01",
        ])
        .unwrap();
        match cli.command {
            Commands::Playback {
                action:
                    PlaybackAction::Save {
                        position,
                        duration,
                        series,
                        percent,
                        ..
                    },
            } => {
                assert_eq!((position, duration, percent), (150, 600, None));
                assert_eq!(series.prefix.as_deref(), Some("Show.S01"));
                assert_eq!(series.suffix, None);
            }
            _ => panic!("expected playback save"),
        }
    }

    #[test]
    fn series_set_parses_timecodes() {
        let cli = Cli::try_parse_from([
            "vidshelf", "series", "set", "Show.S01", "1080p", "--skip-intro",
            "--intro-start", "0:30", "--intro-end", "01:30",
        ])
        .unwrap();
        match cli.command {
            Commands::Series {
                action: SeriesAction::Set { edits, .. },
            } => {
                assert_eq!(edits.skip_intro, Some(true));
                assert_eq!(edits.autoplay, None);
                assert_eq!(edits.intro_start, Some(30));
                assert_eq!(edits.intro_end, Some(90));
                assert_eq!(edits.credits, None);
            }
            _ => panic!("expected series set"),
        }

        assert!(
            Cli::try_parse_from([
                "vidshelf", "series", "set", "Show.S01", "1080p", "--intro-start", "1:75",
            ])
            .is_err()
        );
    }

    #[test]
    fn series_set_flags_can_be_turned_off() {
        let cli = Cli::try_parse_from([
            "vidshelf", "series", "set", "Show.S01", "1080p", "--autoplay", "false",
            "--skip-outro",
        ])
        .unwrap();
        match cli.command {
            Commands::Series {
                action: SeriesAction::Set { edits, .. },
            } => {
                assert_eq!(edits.autoplay, Some(false));
                assert_eq!(edits.skip_outro, Some(true));
                assert_eq!(edits.skip_intro, None);
            }
            _ => panic!("expected series set"),
        }
    }
}
