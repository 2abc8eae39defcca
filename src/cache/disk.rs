use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::Cache;
use crate::error::{Error, Result};

const CACHE_DIR_NAME: &str = "rapid7-cli";

pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// One JSON file per entry under `<root>/<namespace>/<sha256(key)>.json`.
/// Every write trims the store back under its entry and byte limits.
pub struct DiskCache {
    root: PathBuf,
    max_entries: usize,
    max_bytes: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    expires_at: i64,
    value: Value,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: u64,
}

impl DiskCache {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).map_err(|e| {
            Error::Config(format!("Failed to initialize cache at {:?}: {}", root, e))
        })?;
        Ok(Self {
            root,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_bytes: DEFAULT_MAX_BYTES,
        })
    }

    pub fn with_limits(mut self, max_entries: usize, max_bytes: u64) -> Self {
        self.max_entries = max_entries;
        self.max_bytes = max_bytes;
        self
    }

    pub fn open_default() -> Result<Self> {
        Self::new(Self::default_dir()?)
    }

    pub fn default_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".cache").join(CACHE_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        let safe: String = namespace
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.root.join(safe)
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.json", Self::hash_key(key)))
    }

    fn read_entry(path: &Path) -> Option<CacheEntry> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(_) => {
                let _ = fs::remove_file(path);
                None
            }
        }
    }

    fn write_entry(&self, namespace: &str, key: &str, entry: &CacheEntry) -> Result<()> {
        fs::create_dir_all(self.namespace_dir(namespace))?;
        let json = serde_json::to_string(entry)?;
        fs::write(self.entry_path(namespace, key), json)?;
        Ok(())
    }

    fn entry_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for ns in fs::read_dir(&self.root)? {
            let ns = ns?.path();
            if !ns.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&ns)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }

    /// Removes every entry and returns how many were deleted.
    pub fn clear(&self) -> Result<usize> {
        let files = self.entry_files()?;
        for path in &files {
            fs::remove_file(path)?;
        }
        Ok(files.len())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        for path in self.entry_files()? {
            stats.entries += 1;
            stats.bytes += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        }
        Ok(stats)
    }

    pub fn cleanup_expired(&self) -> Result<usize> {
        let now = Utc::now().timestamp();
        let mut removed = 0;
        for path in self.entry_files()? {
            let expired = Self::read_entry(&path).is_none_or(|entry| entry.expires_at <= now);
            if expired {
                // corrupt entries are already gone by now
                if path.exists() {
                    fs::remove_file(&path)?;
                }
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes entries soonest to expire (expired and corrupt ones first)
    /// until the store is within its limits. Returns how many were removed.
    pub fn evict_over_limit(&self) -> Result<usize> {
        let mut entries = Vec::new();
        for path in self.entry_files()? {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            let expires_at = Self::read_entry(&path).map_or(i64::MIN, |entry| entry.expires_at);
            entries.push((expires_at, size, path));
        }

        let mut count = entries.len();
        let mut bytes: u64 = entries.iter().map(|(_, size, _)| size).sum();
        if count <= self.max_entries && bytes <= self.max_bytes {
            return Ok(0);
        }

        entries.sort_by_key(|(expires_at, _, _)| *expires_at);
        let mut removed = 0;
        for (_, size, path) in entries {
            if count <= self.max_entries && bytes <= self.max_bytes {
                break;
            }
            if path.exists() {
                fs::remove_file(&path)?;
            }
            count -= 1;
            bytes = bytes.saturating_sub(size);
            removed += 1;
        }

        tracing::debug!("evicted {} cache entries", removed);
        Ok(removed)
    }
}

impl Cache for DiskCache {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let path = self.entry_path(namespace, key);
        let entry = Self::read_entry(&path)?;
        if entry.expires_at <= Utc::now().timestamp() {
            let _ = fs::remove_file(&path);
            return None;
        }
        tracing::debug!("cache hit: {}", namespace);
        Some(entry.value)
    }

    fn set(&self, namespace: &str, key: &str, value: &Value, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let entry = CacheEntry {
            expires_at: Utc::now().timestamp().saturating_add(ttl_secs),
            value: value.clone(),
        };
        if let Err(e) = self.write_entry(namespace, key, &entry) {
            tracing::warn!("Failed to write cache entry in {}: {}", namespace, e);
            return;
        }
        if let Err(e) = self.evict_over_limit() {
            tracing::warn!("Failed to trim cache: {}", e);
        }
    }
}
