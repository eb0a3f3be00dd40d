//! Typed key/value configuration grouped into categories.
//!
//! Values are always stored as text next to a type tag. Reads coerce the
//! text according to the tag and fall back to the raw string when it does
//! not parse, so a bad value never turns into an error.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::pool::{ConnectionPool, PooledConnection};
use crate::schema::create_config_schema;

// ── Types ───────────────────────────────────────────────────────────────────

/// How a stored value should be interpreted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    String,
    Int,
    Bool,
    Path,
}

impl ConfigType {
    pub const ALL: [ConfigType; 4] = [Self::String, Self::Int, Self::Bool, Self::Path];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Path => "path",
        }
    }
}

impl FromStr for ConfigType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| StoreError::validation("type", format!("unknown type '{s}'")))
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping used by `get_category` and the CLI listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigCategory {
    General,
    Cec,
    Media,
    Ui,
}

impl ConfigCategory {
    pub const ALL: [ConfigCategory; 4] = [Self::General, Self::Cec, Self::Media, Self::Ui];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Cec => "cec",
            Self::Media => "media",
            Self::Ui => "ui",
        }
    }
}

impl FromStr for ConfigCategory {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| StoreError::validation("category", format!("unknown category '{s}'")))
    }
}

impl fmt::Display for ConfigCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration value after read-time coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Bool(bool),
    Path(PathBuf),
}

impl ConfigValue {
    /// Interpret stored text according to `config_type`.
    ///
    /// Total: text that does not parse as the requested type comes back
    /// unchanged as `ConfigValue::String`.
    pub fn coerce(raw: &str, config_type: ConfigType) -> Self {
        match config_type {
            ConfigType::Int => raw
                .trim()
                .parse()
                .map(Self::Int)
                .unwrap_or_else(|_| Self::String(raw.to_string())),
            ConfigType::Bool => Self::Bool(matches!(
                raw.to_lowercase().as_str(),
                "true" | "1" | "yes"
            )),
            ConfigType::Path => Self::Path(PathBuf::from(raw)),
            ConfigType::String => Self::String(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    /// JSON form used by `export_config`: numbers and booleans stay typed.
    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Path(p) => serde_json::Value::String(p.to_string_lossy().into_owned()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// A config row with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub value: ConfigValue,
    pub config_type: ConfigType,
    pub category: ConfigCategory,
    pub description: String,
    pub modified_at: String,
}

/// Whether a write may replace an existing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Insert, or replace the existing row.
    #[default]
    Upsert,
    /// Insert only when the key is absent; existing values are untouched.
    InsertIfAbsent,
}

/// Outcome of [`ConfigSession::import_config`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Entries inserted or overwritten.
    pub written: usize,
    /// Entries left alone because the key already existed.
    pub skipped: usize,
    /// Entries rejected as malformed.
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub key: String,
    pub reason: String,
}

/// On-disk shape of one exported entry.
#[derive(Debug, Serialize, Deserialize)]
struct ExportedEntry {
    value: serde_json::Value,
    #[serde(rename = "type")]
    config_type: String,
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    modified_at: Option<String>,
}

// ── Defaults ────────────────────────────────────────────────────────────────

type DefaultEntry = (&'static str, &'static str, ConfigType, ConfigCategory, &'static str);

const DEFAULTS: &[DefaultEntry] = &[
    ("log_dir", "Log", ConfigType::Path, ConfigCategory::General, "Log directory"),
    ("auto_save_interval", "60", ConfigType::Int, ConfigCategory::General, "Auto-save interval (seconds)"),
    ("debug_mode", "false", ConfigType::Bool, ConfigCategory::General, "Debug mode"),
    ("cec_device", "/dev/cec1", ConfigType::String, ConfigCategory::Cec, "CEC device"),
    ("cec_key_play", "0", ConfigType::Int, ConfigCategory::Cec, "OK (Play/Pause) key code"),
    ("cec_key_pause", "0", ConfigType::Int, ConfigCategory::Cec, "PAUSE key code"),
    ("cec_key_up", "1", ConfigType::Int, ConfigCategory::Cec, "UP key code"),
    ("cec_key_down", "2", ConfigType::Int, ConfigCategory::Cec, "DOWN key code"),
    ("cec_key_left", "3", ConfigType::Int, ConfigCategory::Cec, "LEFT key code"),
    ("cec_key_right", "4", ConfigType::Int, ConfigCategory::Cec, "RIGHT key code"),
    ("cec_key_red", "68", ConfigType::Int, ConfigCategory::Cec, "RED key code"),
    ("cec_key_green", "113", ConfigType::Int, ConfigCategory::Cec, "GREEN key code"),
    ("cec_key_yellow", "116", ConfigType::Int, ConfigCategory::Cec, "YELLOW key code"),
    ("cec_key_blue", "217", ConfigType::Int, ConfigCategory::Cec, "BLUE key code"),
    ("cec_key_0", "32", ConfigType::Int, ConfigCategory::Cec, "0 key code"),
    ("cec_key_1", "33", ConfigType::Int, ConfigCategory::Cec, "1 key code"),
    ("cec_key_2", "34", ConfigType::Int, ConfigCategory::Cec, "2 key code"),
    ("cec_key_3", "35", ConfigType::Int, ConfigCategory::Cec, "3 key code"),
    ("cec_key_4", "36", ConfigType::Int, ConfigCategory::Cec, "4 key code"),
    ("cec_key_5", "37", ConfigType::Int, ConfigCategory::Cec, "5 key code"),
    ("cec_key_6", "38", ConfigType::Int, ConfigCategory::Cec, "6 key code"),
    ("cec_key_7", "39", ConfigType::Int, ConfigCategory::Cec, "7 key code"),
    ("cec_key_8", "40", ConfigType::Int, ConfigCategory::Cec, "8 key code"),
    ("cec_key_9", "41", ConfigType::Int, ConfigCategory::Cec, "9 key code"),
    ("media_dir", "/media", ConfigType::Path, ConfigCategory::Media, "Media directory"),
    ("video_extensions", "avi,mp4,mkv,mov,wmv,flv", ConfigType::String, ConfigCategory::Media, "Video file extensions"),
    ("menu_height", "20", ConfigType::Int, ConfigCategory::Ui, "Menu height"),
    ("menu_width", "60", ConfigType::Int, ConfigCategory::Ui, "Menu width"),
];

// ── Store ───────────────────────────────────────────────────────────────────

/// Configuration storage backed by a shared pool.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    pool: Arc<ConnectionPool>,
}

impl ConfigStore {
    /// Create the config table if needed and seed any missing defaults.
    /// Existing values are never overwritten.
    pub fn new(pool: Arc<ConnectionPool>) -> Result<Self> {
        {
            let conn = pool.acquire()?;
            create_config_schema(&conn)?;
            seed_defaults(&conn, pool.path())?;
        }
        Ok(Self { pool })
    }

    pub fn session(&self) -> Result<ConfigSession<'_>> {
        Ok(ConfigSession {
            conn: self.pool.acquire()?,
        })
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}

fn seed_defaults(conn: &Connection, db_path: &Path) -> Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let db_path = db_path.to_string_lossy();
    let mut seeded = usize::from(insert_entry_if_absent(
        &tx,
        "db_path",
        &db_path,
        ConfigType::String,
        ConfigCategory::General,
        "Database path",
    )?);
    for (key, value, config_type, category, description) in DEFAULTS {
        seeded += usize::from(insert_entry_if_absent(
            &tx,
            key,
            value,
            *config_type,
            *category,
            description,
        )?);
    }
    tx.commit()?;
    if seeded > 0 {
        log::debug!("Seeded {} default config entries", seeded);
    }
    Ok(())
}

/// Scoped access to the config table through one pooled connection.
#[derive(Debug)]
pub struct ConfigSession<'p> {
    conn: PooledConnection<'p>,
}

impl ConfigSession<'_> {
    /// Typed value for `key`, or `None` if it is not set.
    pub fn get(&self, key: &str) -> Result<Option<ConfigValue>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value, type FROM config WHERE key = ?1")?;
        let row = stmt
            .query_row(params![key], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .optional()?;
        Ok(row.map(|(value, type_str)| ConfigValue::coerce(&value, parse_stored_type(&type_str))))
    }

    pub fn get_or(&self, key: &str, default: ConfigValue) -> Result<ConfigValue> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Insert or replace `key`.
    pub fn upsert(
        &self,
        key: &str,
        value: &str,
        config_type: ConfigType,
        category: ConfigCategory,
        description: &str,
    ) -> Result<()> {
        upsert_entry(&self.conn, key, value, config_type, category, description)
    }

    /// Insert `key` only if it does not exist yet. Returns whether it did.
    pub fn insert_if_absent(
        &self,
        key: &str,
        value: &str,
        config_type: ConfigType,
        category: ConfigCategory,
        description: &str,
    ) -> Result<bool> {
        insert_entry_if_absent(&self.conn, key, value, config_type, category, description)
    }

    /// Write `key` with the given mode. Returns whether a row was written.
    pub fn set(
        &self,
        key: &str,
        value: &str,
        config_type: ConfigType,
        category: ConfigCategory,
        description: &str,
        mode: WriteMode,
    ) -> Result<bool> {
        write_entry(&self.conn, key, value, config_type, category, description, mode)
    }

    /// Typed values of every key in `category`.
    pub fn get_category(&self, category: ConfigCategory) -> Result<BTreeMap<String, ConfigValue>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT key, value, type FROM config WHERE category = ?1")?;
        let rows = stmt.query_map(params![category.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut values = BTreeMap::new();
        for row in rows {
            let (key, value, type_str) = row?;
            values.insert(key, ConfigValue::coerce(&value, parse_stored_type(&type_str)));
        }
        Ok(values)
    }

    /// Every entry with its metadata.
    pub fn get_all(&self) -> Result<BTreeMap<String, ConfigEntry>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT key, value, type, category, description, modified_at
             FROM config ORDER BY category, key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut entries = BTreeMap::new();
        for row in rows {
            let (key, value, type_str, category_str, description, modified_at) = row?;
            let config_type = parse_stored_type(&type_str);
            let category = category_str.parse().unwrap_or_else(|_| {
                log::warn!(
                    "Config key '{}' has unknown category '{}', listing it under general",
                    key,
                    category_str,
                );
                ConfigCategory::General
            });
            entries.insert(
                key,
                ConfigEntry {
                    value: ConfigValue::coerce(&value, config_type),
                    config_type,
                    category,
                    description,
                    modified_at,
                },
            );
        }
        Ok(entries)
    }

    /// Remove `key`. Returns false if it was not set.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM config WHERE key = ?1", params![key])?;
        Ok(changed > 0)
    }

    /// Write every entry to `path` as pretty-printed JSON. Returns the number
    /// of entries written.
    pub fn export_config(&self, path: &Path) -> Result<usize> {
        let exported: BTreeMap<String, ExportedEntry> = self
            .get_all()?
            .into_iter()
            .map(|(key, entry)| {
                (
                    key,
                    ExportedEntry {
                        value: entry.value.to_json(),
                        config_type: entry.config_type.as_str().to_string(),
                        category: entry.category.as_str().to_string(),
                        description: entry.description,
                        modified_at: Some(entry.modified_at),
                    },
                )
            })
            .collect();

        let serialized = serde_json::to_string_pretty(&exported)?;
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&tmp, serialized).and_then(|()| std::fs::rename(&tmp, path)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        log::debug!("Exported {} config entries to {}", exported.len(), path.display());
        Ok(exported.len())
    }

    /// Replay an exported file through `set`.
    ///
    /// The file must be a JSON object; anything else is an error. Individual
    /// malformed entries are collected in the report and skipped while the
    /// rest are applied in a single transaction.
    pub fn import_config(&self, path: &Path, mode: WriteMode) -> Result<ImportReport> {
        let contents = std::fs::read_to_string(path)?;
        let document: serde_json::Value = serde_json::from_str(&contents)?;
        let serde_json::Value::Object(entries) = document else {
            return Err(StoreError::validation(
                "import file",
                format!("{} does not contain a JSON object", path.display()),
            ));
        };

        let mut report = ImportReport::default();
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        for (key, raw) in entries {
            let parsed = match parse_exported(&key, raw) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    log::warn!("Skipping config key '{}': {}", key, reason);
                    report.failures.push(ImportFailure { key, reason });
                    continue;
                }
            };
            let (value, config_type, category, description) = parsed;

            match write_entry(&tx, &key, &value, config_type, category, &description, mode) {
                Ok(true) => report.written += 1,
                Ok(false) => report.skipped += 1,
                Err(StoreError::Validation { message, .. }) => {
                    report.failures.push(ImportFailure {
                        key,
                        reason: message,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        tx.commit()?;

        log::debug!(
            "Imported config from {}: {} written, {} skipped, {} failed",
            path.display(),
            report.written,
            report.skipped,
            report.failures.len(),
        );
        Ok(report)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Type tags written by hand or by older tools may be unknown; read them as
/// plain strings.
fn parse_stored_type(type_str: &str) -> ConfigType {
    type_str.parse().unwrap_or(ConfigType::String)
}

fn parse_exported(
    key: &str,
    raw: serde_json::Value,
) -> std::result::Result<(String, ConfigType, ConfigCategory, String), String> {
    let entry: ExportedEntry = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    let config_type: ConfigType = entry.config_type.parse().map_err(|e: StoreError| e.to_string())?;
    let category: ConfigCategory = entry.category.parse().map_err(|e: StoreError| e.to_string())?;
    let value = match entry.value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => return Err(format!("value for '{key}' must be a scalar, got {other}")),
    };
    Ok((value, config_type, category, entry.description))
}

fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(StoreError::validation("key", "must not be empty"));
    }
    Ok(())
}

fn write_entry(
    conn: &Connection,
    key: &str,
    value: &str,
    config_type: ConfigType,
    category: ConfigCategory,
    description: &str,
    mode: WriteMode,
) -> Result<bool> {
    match mode {
        WriteMode::Upsert => {
            upsert_entry(conn, key, value, config_type, category, description)?;
            Ok(true)
        }
        WriteMode::InsertIfAbsent => {
            insert_entry_if_absent(conn, key, value, config_type, category, description)
        }
    }
}

fn upsert_entry(
    conn: &Connection,
    key: &str,
    value: &str,
    config_type: ConfigType,
    category: ConfigCategory,
    description: &str,
) -> Result<()> {
    check_key(key)?;
    conn.execute(
        "INSERT INTO config (key, value, type, category, description, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET
             value = excluded.value,
             type = excluded.type,
             category = excluded.category,
             description = excluded.description,
             modified_at = excluded.modified_at",
        params![key, value, config_type.as_str(), category.as_str(), description],
    )?;
    Ok(())
}

fn insert_entry_if_absent(
    conn: &Connection,
    key: &str,
    value: &str,
    config_type: ConfigType,
    category: ConfigCategory,
    description: &str,
) -> Result<bool> {
    check_key(key)?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO config (key, value, type, category, description, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
        params![key, value, config_type.as_str(), category.as_str(), description],
    )?;
    Ok(inserted > 0)
}
