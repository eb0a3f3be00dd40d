//! SQLite persistence for the video menus.
//!
//! Tracks playback progress per file, per-series playback preferences and a
//! small typed configuration set, all in one database file shared through a
//! bounded connection pool (via rusqlite with bundled feature).

pub mod config;
pub mod error;
pub mod playback;
pub mod pool;
pub mod schema;
pub mod series;
pub mod settings;
pub mod timecode;

use std::path::Path;
use std::sync::Arc;

pub use config::{
    ConfigCategory, ConfigEntry, ConfigSession, ConfigStore, ConfigType, ConfigValue,
    ImportFailure, ImportReport, WriteMode,
};
pub use error::{Result, StoreError};
pub use playback::{PlaybackRecord, PlaybackSession, PlaybackStatus, PlaybackStore, Progress};
pub use pool::{ConnectionPool, PoolConfig, PooledConnection};
pub use series::SeriesSettings;
pub use settings::Settings;
pub use timecode::{format_mmss, parse_mmss};

/// The pool and both stores opened on one database file.
#[derive(Debug, Clone)]
pub struct Stores {
    pub pool: Arc<ConnectionPool>,
    pub playback: PlaybackStore,
    pub config: ConfigStore,
}

/// Open (creating if needed) the database at `path` with every table and
/// the default config entries in place.
pub fn open_stores(path: &Path, config: PoolConfig) -> Result<Stores> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let pool = Arc::new(ConnectionPool::open(path, config)?);
    let playback = PlaybackStore::new(Arc::clone(&pool))?;
    let config = ConfigStore::new(Arc::clone(&pool))?;
    Ok(Stores {
        pool,
        playback,
        config,
    })
}
