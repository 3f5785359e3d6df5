//! Key-value cache stores with per-entry TTL.
//!
//! `MemoryCache` lives as long as the process; `FileCache` survives across
//! processes and backs the 24-hour language list cache.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

pub trait CacheStore: Send + Sync {
    /// Fetch a value; expired entries read as missing
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

fn expiry_after(ttl: Duration) -> DateTime<Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36500));
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: expiry_after(ttl),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Process-local cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Discarding unreadable cache file {}: {}", path.display(), e);
                self.remove(key)?;
                return Ok(None);
            }
        };

        if entry.is_expired() {
            self.remove(key)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = CacheEntry::new(value, ttl);
        std::fs::write(self.path_for(key), serde_json::to_string(&entry)?)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
