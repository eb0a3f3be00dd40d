//! Database settings file (`~/.config/vidshelf/settings.toml`).
//!
//! The CLI and the menus both read this so they agree on where the database
//! lives and how the connection pool is sized. Every field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::pool::PoolConfig;

const DB_FILE_NAME: &str = "vidshelf.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// `[database]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_min_connections")]
    pub min_connections: usize,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Defaults to `max_connections` when absent.
    #[serde(default)]
    pub max_idle: Option<usize>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub acquire_timeout_ms: Option<u64>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            max_idle: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            acquire_timeout_ms: None,
        }
    }
}

const fn default_min_connections() -> usize {
    2
}

const fn default_max_connections() -> usize {
    10
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl DatabaseSettings {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            min_connections: self.min_connections,
            max_connections: self.max_connections,
            max_idle: self.max_idle.unwrap_or(self.max_connections),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            acquire_timeout: self.acquire_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl Settings {
    /// Load the settings file, falling back to defaults if it is missing or
    /// cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                log::debug!("No settings file at {}, using defaults", path.display());
                return Self::default();
            }
        };
        Self::parse(&contents).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve the database file using a priority chain:
    ///
    /// 1. CLI override (if `Some`)
    /// 2. `database.path` in `settings.toml`
    /// 3. `<data dir>/vidshelf/vidshelf.db`
    /// 4. `./vidshelf.db`
    pub fn resolve_database_path(&self, cli_override: Option<PathBuf>) -> PathBuf {
        if let Some(p) = cli_override {
            return p;
        }
        if let Some(p) = &self.database.path {
            return p.clone();
        }
        default_database_path()
    }
}

/// Canonical path to the settings file.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("vidshelf").join("settings.toml")
}

pub fn default_database_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("vidshelf").join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.database.pool_config(), PoolConfig::default());
    }

    #[test]
    fn partial_database_table() {
        let settings = Settings::parse(
            r#"
            [database]
            path = "/srv/video/shelf.db"
            max_connections = 4
            acquire_timeout_ms = 250
            "#,
        )
        .unwrap();

        let db = &settings.database;
        assert_eq!(db.path.as_deref(), Some(Path::new("/srv/video/shelf.db")));
        assert_eq!(db.min_connections, 2);

        let pool = db.pool_config();
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.max_idle, 4);
        assert_eq!(pool.busy_timeout, Duration::from_secs(5));
        assert_eq!(pool.acquire_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(Settings::parse("[database]\nmax_connections = \"many\"").is_err());
    }

    #[test]
    fn cli_override_wins() {
        let settings = Settings::parse("[database]\npath = \"/from/settings.db\"").unwrap();
        assert_eq!(
            settings.resolve_database_path(Some(PathBuf::from("/from/cli.db"))),
            PathBuf::from("/from/cli.db")
        );
        assert_eq!(
            settings.resolve_database_path(None),
            PathBuf::from("/from/settings.db")
        );
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn garbage_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[database\nnot toml").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}
