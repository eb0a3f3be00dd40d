//! Bounded pool of SQLite connections to a single database file.
//!
//! Pooling itself is `r2d2` over `r2d2_sqlite`: `min_connections` maps to
//! `min_idle`, `max_connections` to `max_size`, and every new connection runs
//! the busy timeout and WAL pragmas from the manager's init hook.
//!
//! Connections are handed out as [`PooledConnection`] guards. Dropping the
//! guard rolls back any transaction left open and returns the connection, so
//! every exit path of a session (including `?` early returns and panics
//! unwinding through it) releases it. A connection released while
//! `max_idle` connections already sit idle is closed instead.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// How long `open` waits for the warm connections.
const OPEN_TIMEOUT: Duration = Duration::from_secs(30);

/// r2d2 always waits against a deadline; an unset acquire timeout uses this.
const WAIT_FOREVER: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Sizing and timeout knobs for a [`ConnectionPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Connections kept open even when nothing is using them.
    pub min_connections: usize,
    /// Hard cap on live connections.
    pub max_connections: usize,
    /// Idle connections kept on release; extras are closed.
    pub max_idle: usize,
    /// How long a statement waits on a locked database file before failing.
    pub busy_timeout: Duration,
    /// How long `acquire` waits for a free connection. `None` waits forever.
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 2,
            max_connections: 10,
            max_idle: 10,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: None,
        }
    }
}

impl PoolConfig {
    fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(StoreError::validation(
                "max_connections",
                "must be at least 1",
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(StoreError::validation(
                "min_connections",
                format!(
                    "{} exceeds max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            ));
        }
        if self.max_idle < self.min_connections || self.max_idle > self.max_connections {
            return Err(StoreError::validation(
                "max_idle",
                format!(
                    "{} must lie between min_connections ({}) and max_connections ({})",
                    self.max_idle, self.min_connections, self.max_connections
                ),
            ));
        }
        Ok(())
    }
}

/// A connection plus the verdict reached when its guard was dropped.
struct ManagedConnection {
    conn: Connection,
    retire: bool,
}

/// `SqliteConnectionManager` that lets the guard decide whether a returned
/// connection goes back to the idle set.
struct SqliteManager {
    inner: SqliteConnectionManager,
}

impl SqliteManager {
    fn new(path: &Path, config: &PoolConfig) -> Self {
        let busy_timeout = config.busy_timeout;
        let inner = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        });
        Self { inner }
    }
}

impl ManageConnection for SqliteManager {
    type Connection = ManagedConnection;
    type Error = rusqlite::Error;

    fn connect(&self) -> std::result::Result<ManagedConnection, rusqlite::Error> {
        Ok(ManagedConnection {
            conn: self.inner.connect()?,
            retire: false,
        })
    }

    fn is_valid(&self, conn: &mut ManagedConnection) -> std::result::Result<(), rusqlite::Error> {
        self.inner.is_valid(&mut conn.conn)
    }

    fn has_broken(&self, conn: &mut ManagedConnection) -> bool {
        conn.retire
    }
}

/// A bounded set of reusable connections to one database file.
pub struct ConnectionPool {
    path: PathBuf,
    config: PoolConfig,
    /// `None` once the pool is closed.
    pool: RwLock<Option<r2d2::Pool<SqliteManager>>>,
}

impl ConnectionPool {
    /// Open a pool on `path`, creating the file if needed, and warm up
    /// `min_connections` connections.
    pub fn open(path: impl AsRef<Path>, config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let manager = SqliteManager::new(&path, &config);

        // Surface a bad path or a failing pragma as the SQLite error itself;
        // r2d2 would only report a timeout.
        drop(manager.connect()?);

        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections as u32)
            .min_idle(Some(config.min_connections as u32))
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(OPEN_TIMEOUT)
            .build(manager)?;
        log::debug!(
            "Opened connection pool on {} ({} warm, max {})",
            path.display(),
            pool.state().connections,
            config.max_connections,
        );

        Ok(Self {
            path,
            config,
            pool: RwLock::new(Some(pool)),
        })
    }

    /// Check out a connection, blocking while the pool is at capacity.
    pub fn acquire(&self) -> Result<PooledConnection<'_>> {
        let pool = self
            .pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StoreError::PoolClosed)?;

        let timeout = self.config.acquire_timeout.unwrap_or(WAIT_FOREVER);
        let inner = pool
            .get_timeout(timeout)
            .map_err(|_| StoreError::PoolTimeout(timeout))?;
        Ok(PooledConnection { pool: self, inner })
    }

    /// Number of live connections, idle or checked out. Zero once closed.
    pub fn current_size(&self) -> usize {
        self.state().map_or(0, |s| s.connections as usize)
    }

    /// Number of connections currently sitting idle.
    pub fn idle_count(&self) -> usize {
        self.state().map_or(0, |s| s.idle_connections as usize)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Refuse further acquires and let go of the idle connections.
    ///
    /// Connections still checked out stay usable; they are closed once the
    /// last guard drops.
    pub fn close(&self) {
        let pool = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if pool.is_some() {
            log::debug!("Closed connection pool on {}", self.path.display());
        }
    }

    fn state(&self) -> Option<r2d2::State> {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(r2d2::Pool::state)
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Exclusive handle to a pooled connection. Returned to the pool on drop.
pub struct PooledConnection<'p> {
    pool: &'p ConnectionPool,
    inner: r2d2::PooledConnection<SqliteManager>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.inner.conn
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.inner.conn
    }
}

impl fmt::Debug for PooledConnection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("path", &self.pool.path)
            .field("autocommit", &self.inner.conn.is_autocommit())
            .finish()
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        let managed = &mut *self.inner;
        if !managed.conn.is_autocommit() {
            if let Err(e) = managed.conn.execute_batch("ROLLBACK") {
                log::warn!("Discarding pooled connection after failed rollback: {}", e);
                managed.retire = true;
                return;
            }
        }
        if self.pool.idle_count() >= self.pool.config.max_idle {
            log::debug!("Closing surplus idle connection");
            managed.retire = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PoolConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_min_above_max() {
        let config = PoolConfig {
            min_connections: 4,
            max_connections: 2,
            max_idle: 2,
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StoreError::Validation { ref field, .. }) if field == "min_connections"
        ));
    }

    #[test]
    fn rejects_zero_max() {
        let config = PoolConfig {
            min_connections: 0,
            max_connections: 0,
            max_idle: 0,
            ..PoolConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_max_idle_below_min() {
        let config = PoolConfig {
            min_connections: 3,
            max_connections: 5,
            max_idle: 1,
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StoreError::Validation { ref field, .. }) if field == "max_idle"
        ));
    }
}
