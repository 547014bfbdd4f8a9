//! SQLite-backed key-value store with per-entry time-to-live.
//!
//! Two planes share one table: volatile entries (prefixed keys, bounded
//! TTL) back the short-lived response cache, while persistent entries
//! (no TTL) hold the offline mirror. Volatile reads and writes never fail
//! outward; they log and report a miss instead.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::mirror;

/// Default TTL for volatile entries. Remote data changes only on explicit
/// user mutation, so a short cache covers rapid navigation while still
/// picking up cross-device changes quickly.
pub const DEFAULT_TTL_SECONDS: i64 = 5 * 60;

/// Prefix separating volatile entries from persistent ones.
const VOLATILE_PREFIX: &str = "cache_";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    stored_at INTEGER NOT NULL,
    ttl_seconds INTEGER
);
"#;

pub struct CacheStore {
  conn: Mutex<Connection>,
  default_ttl: i64,
}

impl CacheStore {
  /// Open or create the store at the default location.
  pub fn open_default() -> Result<Self> {
    Self::open(&Self::default_path()?)
  }

  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;
    Self::init(conn)
  }

  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::init(conn)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;
    Ok(Self {
      conn: Mutex::new(conn),
      default_ttl: DEFAULT_TTL_SECONDS,
    })
  }

  /// Override the default TTL for volatile entries.
  pub fn with_default_ttl(mut self, seconds: i64) -> Self {
    self.default_ttl = seconds;
    self
  }

  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(data_dir.join("pantry").join("cache.db"))
  }

  /// Store a volatile entry, overwriting any existing one. Storage failures
  /// (e.g. a full disk) are logged, never returned.
  pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: Option<i64>) {
    let ttl = ttl_seconds.unwrap_or(self.default_ttl);
    if let Err(e) = self.put(&volatile_key(key), value, Some(ttl)) {
      warn!("failed to cache {}: {}", key, e);
    }
  }

  /// Store a persistent (TTL-less) entry. The offline mirror uses this and
  /// needs to observe the failure.
  pub fn set_persistent<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
    self.put(key, value, None)
  }

  fn put<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: Option<i64>) -> Result<()> {
    let data = serde_json::to_string(value).map_err(|e| eyre!("Failed to serialize {}: {}", key, e))?;
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    conn
      .execute(
        "INSERT OR REPLACE INTO kv_cache (key, value, stored_at, ttl_seconds) VALUES (?, ?, ?, ?)",
        params![key, data, Utc::now().timestamp_millis(), ttl_seconds],
      )
      .map_err(|e| eyre!("Failed to store {}: {}", key, e))?;
    Ok(())
  }

  /// Read a volatile entry. Expired and corrupt entries are removed and
  /// report absent.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    self.read(&volatile_key(key))
  }

  pub fn get_persistent<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    self.read(key)
  }

  fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let (data, stored_at, ttl_seconds) = self.read_raw(key)?;

    if let Some(ttl) = ttl_seconds {
      if Utc::now().timestamp_millis() - stored_at > ttl * 1000 {
        debug!("cache entry {} expired", key);
        self.remove(key);
        return None;
      }
    }

    match serde_json::from_str(&data) {
      Ok(value) => Some(value),
      Err(e) => {
        warn!("removing corrupt cache entry {}: {}", key, e);
        self.remove(key);
        None
      }
    }
  }

  fn read_raw(&self, key: &str) -> Option<(String, i64, Option<i64>)> {
    let conn = match self.conn.lock() {
      Ok(conn) => conn,
      Err(e) => {
        warn!("cache lock poisoned: {}", e);
        return None;
      }
    };
    conn
      .query_row(
        "SELECT value, stored_at, ttl_seconds FROM kv_cache WHERE key = ?",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
      )
      .ok()
  }

  pub fn delete(&self, key: &str) {
    self.remove(&volatile_key(key));
  }

  pub fn delete_persistent(&self, key: &str) {
    self.remove(key);
  }

  fn remove(&self, key: &str) {
    let Ok(conn) = self.conn.lock() else {
      return;
    };
    if let Err(e) = conn.execute("DELETE FROM kv_cache WHERE key = ?", params![key]) {
      warn!("failed to remove cache entry {}: {}", key, e);
    }
  }

  /// Drop every volatile entry. Persistent mirror entries stay; this is the
  /// invalidation the data access layer runs after mutations.
  pub fn clear_volatile(&self) {
    let Ok(conn) = self.conn.lock() else {
      return;
    };
    if let Err(e) = conn.execute(
      "DELETE FROM kv_cache WHERE key LIKE ?",
      params![format!("{}%", VOLATILE_PREFIX)],
    ) {
      warn!("failed to clear volatile cache: {}", e);
    }
  }

  /// Full reset: the volatile plane plus the mirror's canonical and legacy
  /// keys, so no stale data survives.
  pub fn clear(&self) {
    self.clear_volatile();
    self.delete_persistent(mirror::MIRROR_KEY);
    for key in mirror::LEGACY_KEYS {
      self.delete_persistent(key);
    }
  }

  #[cfg(test)]
  pub(crate) fn execute_raw(&self, sql: &str) {
    self.conn.lock().unwrap().execute_batch(sql).unwrap();
  }
}

fn volatile_key(key: &str) -> String {
  format!("{}{}", VOLATILE_PREFIX, key)
}
