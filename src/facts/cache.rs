//! A TTL-aware response cache persisted as a single JSON table.
//!
//! [`TtlCache`] memoizes responses from external sources for a bounded duration. Each
//! write rewrites the whole table through a [`CacheStore`], so the cache survives restarts.
//! Freshness is only evaluated when reading: stale entries behave like misses and are
//! dropped the next time the table is loaded. There is no size bound and no eviction
//! policy beyond the TTL; the cache is meant for tens of entries.

use crate::Result;
use chrono::{DateTime, Utc};
use core::fmt::Debug;
use core::time::Duration;
use ohno::IntoAppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const LOG_TARGET: &str = "     cache";

/// The persisted representation of the cache: key to entry.
pub type CacheTable = BTreeMap<String, CacheEntry>;

/// A memoized payload and the instant it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether this entry is younger than `ttl` at `now`.
    ///
    /// Entries stamped in the future (clock skew) are considered fresh.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.fetched_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => {
                log::debug!(target: LOG_TARGET, "Cache timestamp is in the future (clock skew detected), treating as fresh");
                true
            }
        }
    }
}

/// Durable storage for a [`CacheTable`].
pub trait CacheStore: Debug + Send + Sync {
    /// Read the whole table. A store that was never written returns an empty table.
    fn read_all(&self) -> Result<CacheTable>;

    /// Replace the whole persisted table.
    fn write_all(&self, table: &CacheTable) -> Result<()>;

    /// Delete the persisted table.
    fn remove(&self) -> Result<()>;
}

/// A [`CacheStore`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for FileStore {
    fn read_all(&self) -> Result<CacheTable> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheTable::new()),
            Err(e) => return Err(e).into_app_err_with(|| format!("unable to open cache file '{}'", self.path.display())),
        };

        serde_json::from_reader(BufReader::new(file)).into_app_err_with(|| format!("unable to parse cache file '{}'", self.path.display()))
    }

    fn write_all(&self, table: &CacheTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create directory '{}'", parent.display()))?;
        }

        let file = File::create(&self.path).into_app_err_with(|| format!("unable to create cache file '{}'", self.path.display()))?;
        let mut writer = BufWriter::new(file);

        #[cfg(debug_assertions)]
        let result = serde_json::to_writer_pretty(&mut writer, table);
        #[cfg(not(debug_assertions))]
        let result = serde_json::to_writer(&mut writer, table);

        result.into_app_err_with(|| format!("unable to write cache file '{}'", self.path.display()))?;
        writer
            .flush()
            .into_app_err_with(|| format!("unable to flush cache file '{}'", self.path.display()))?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).into_app_err_with(|| format!("unable to remove cache file '{}'", self.path.display())),
        }
    }
}

/// A [`CacheStore`] holding the serialized table in memory.
///
/// Keeps the JSON text rather than the table itself so that a reload goes through the
/// same parsing as a file-backed store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    text: Mutex<Option<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `text`, which need not be valid JSON.
    #[must_use]
    pub fn with_contents(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
        }
    }

    /// The currently persisted text, if any.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.text.lock().expect("lock not poisoned").clone()
    }
}

impl CacheStore for MemoryStore {
    fn read_all(&self) -> Result<CacheTable> {
        match self.text.lock().expect("lock not poisoned").as_deref() {
            Some(text) => serde_json::from_str(text).into_app_err("unable to parse in-memory cache"),
            None => Ok(CacheTable::new()),
        }
    }

    fn write_all(&self, table: &CacheTable) -> Result<()> {
        let text = serde_json::to_string(table).into_app_err("unable to serialize in-memory cache")?;
        *self.text.lock().expect("lock not poisoned") = Some(text);
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.text.lock().expect("lock not poisoned") = None;
        Ok(())
    }
}

impl<S: CacheStore + ?Sized> CacheStore for std::sync::Arc<S> {
    fn read_all(&self) -> Result<CacheTable> {
        (**self).read_all()
    }

    fn write_all(&self, table: &CacheTable) -> Result<()> {
        (**self).write_all(table)
    }

    fn remove(&self) -> Result<()> {
        (**self).remove()
    }
}

/// A TTL-aware cache of JSON payloads keyed by opaque strings.
///
/// Keys are built by callers from the logical operation and its arguments so that
/// different requests never share a slot.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    store: Box<dyn CacheStore>,
    entries: Mutex<CacheTable>,
}

impl TtlCache {
    /// Create a cache from the contents of `store`, keeping only entries that are still fresh at `now`.
    ///
    /// A store that cannot be read or parsed is treated as empty.
    pub fn load(store: impl CacheStore + 'static, ttl: Duration, now: DateTime<Utc>) -> Self {
        let table = match store.read_all() {
            Ok(table) => table,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Discarding unreadable cache: {e:#}");
                CacheTable::new()
            }
        };

        let total = table.len();
        let entries: CacheTable = table.into_iter().filter(|(_, entry)| entry.is_fresh(ttl, now)).collect();

        log::debug!(target: LOG_TARGET, "Loaded {} of {total} cache entries (TTL: {}s)", entries.len(), ttl.as_secs());

        Self {
            ttl,
            store: Box::new(store),
            entries: Mutex::new(entries),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries held in memory, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock not poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a payload, returning `None` if it is missing or older than the TTL.
    #[must_use]
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<serde_json::Value> {
        let entries = self.entries.lock().expect("lock not poisoned");

        let Some(entry) = entries.get(key) else {
            log::debug!(target: LOG_TARGET, "Cache miss for {key}");
            return None;
        };

        if entry.is_fresh(self.ttl, now) {
            log::debug!(target: LOG_TARGET, "Cache hit for {key}");
            Some(entry.value.clone())
        } else {
            log::debug!(target: LOG_TARGET, "Cache expired for {key}");
            None
        }
    }

    /// Look up a payload and deserialize it. A payload of the wrong shape is a miss.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let value = self.get(key, now)?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Cache miss for {key}: {e:#}");
                None
            }
        }
    }

    /// Store a payload stamped with `now` and persist the whole table.
    ///
    /// A failure to persist is logged; the in-memory entry is kept regardless.
    pub fn put(&self, key: impl Into<String>, value: serde_json::Value, now: DateTime<Utc>) {
        let key = key.into();
        let mut entries = self.entries.lock().expect("lock not poisoned");

        let _ = entries.insert(key.clone(), CacheEntry { value, fetched_at: now });

        if let Err(e) = self.store.write_all(&entries) {
            log::warn!(target: LOG_TARGET, "Unable to persist cache after storing {key}: {e:#}");
        }
    }

    /// Serialize and store a payload.
    pub fn put_as<T: Serialize>(&self, key: impl Into<String>, data: &T, now: DateTime<Utc>) {
        let key = key.into();
        match serde_json::to_value(data) {
            Ok(value) => self.put(key, value, now),
            Err(e) => log::warn!(target: LOG_TARGET, "Unable to serialize cache entry {key}: {e:#}"),
        }
    }

    /// Drop every entry, in memory and in the store.
    pub fn clear(&self) -> Result<()> {
        self.entries.lock().expect("lock not poisoned").clear();
        self.store.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(30 * 60);

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn put_then_get_within_ttl() {
        let cache = TtlCache::load(MemoryStore::new(), TTL, at(0));
        cache.put("stats:acme/lead", json!({ "stars": 3 }), at(0));

        assert_eq!(cache.get("stats:acme/lead", at(60)), Some(json!({ "stars": 3 })));
        assert_eq!(cache.get("stats:acme/lead", at(29 * 60 + 59)), Some(json!({ "stars": 3 })));
    }

    #[test]
    fn get_after_ttl_is_miss() {
        let cache = TtlCache::load(MemoryStore::new(), TTL, at(0));
        cache.put("k", json!(1), at(0));

        assert!(cache.get("k", at(30 * 60)).is_none());
        assert!(cache.get("k", at(31 * 60)).is_none());

        // Stale entries stay in memory until the next load.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn future_timestamp_is_fresh() {
        let cache = TtlCache::load(MemoryStore::new(), TTL, at(0));
        cache.put("k", json!("v"), at(3600));

        assert_eq!(cache.get("k", at(0)), Some(json!("v")));
    }

    #[test]
    fn keys_do_not_collide() {
        let cache = TtlCache::load(MemoryStore::new(), TTL, at(0));
        cache.put("activity:acme/x", json!([true, false, false, false, false]), at(0));
        cache.put("activity:acme/y", json!([false, true, false, false, false]), at(0));

        assert_eq!(cache.get("activity:acme/x", at(1)), Some(json!([true, false, false, false, false])));
        assert_eq!(cache.get("activity:acme/y", at(1)), Some(json!([false, true, false, false, false])));
    }

    #[test]
    fn put_overwrites_and_restamps() {
        let cache = TtlCache::load(MemoryStore::new(), TTL, at(0));
        cache.put("k", json!(1), at(0));
        cache.put("k", json!(2), at(20 * 60));

        assert_eq!(cache.get("k", at(40 * 60)), Some(json!(2)));
    }

    #[test]
    fn reload_keeps_live_entries_and_drops_expired_ones() {
        let store = Arc::new(MemoryStore::new());

        let cache = TtlCache::load(Arc::clone(&store), TTL, at(0));
        cache.put("old", json!("old"), at(0));
        cache.put("new", json!("new"), at(20 * 60));
        drop(cache);

        let reloaded = TtlCache::load(Arc::clone(&store), TTL, at(35 * 60));
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get("old", at(35 * 60)).is_none());
        assert_eq!(reloaded.get("new", at(35 * 60)), Some(json!("new")));
    }

    #[test]
    fn corrupt_store_is_treated_as_empty() {
        let cache = TtlCache::load(MemoryStore::with_contents("{ not json"), TTL, at(0));
        assert!(cache.is_empty());

        cache.put("k", json!(1), at(0));
        assert_eq!(cache.get("k", at(0)), Some(json!(1)));
    }

    #[test]
    fn persisted_layout_uses_value_and_fetched_at() {
        let store = Arc::new(MemoryStore::new());
        let cache = TtlCache::load(Arc::clone(&store), TTL, at(0));
        cache.put("k", json!({ "a": 1 }), at(0));

        let persisted: serde_json::Value = serde_json::from_str(&store.contents().unwrap()).unwrap();
        assert_eq!(persisted["k"]["value"], json!({ "a": 1 }));
        assert!(persisted["k"]["fetchedAt"].is_string());
    }

    #[test]
    fn clear_empties_memory_and_store() {
        let store = Arc::new(MemoryStore::new());
        let cache = TtlCache::load(Arc::clone(&store), TTL, at(0));
        cache.put("k", json!(1), at(0));

        cache.clear().unwrap();

        assert!(cache.is_empty());
        assert!(cache.get("k", at(0)).is_none());
        assert!(store.contents().is_none());
    }

    #[test]
    fn typed_round_trip_and_shape_mismatch() {
        let cache = TtlCache::load(MemoryStore::new(), TTL, at(0));
        cache.put_as("n", &vec![1_u32, 2, 3], at(0));

        assert_eq!(cache.get_as::<Vec<u32>>("n", at(1)), Some(vec![1, 2, 3]));
        assert!(cache.get_as::<String>("n", at(1)).is_none());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn file_store_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("github-cache.json");

        let cache = TtlCache::load(FileStore::new(&path), TTL, at(0));
        cache.put("k", json!("v"), at(0));
        assert!(path.exists());

        let reloaded = TtlCache::load(FileStore::new(&path), TTL, at(60));
        assert_eq!(reloaded.get("k", at(60)), Some(json!("v")));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn file_store_missing_and_corrupt_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cache.json");

        let store = FileStore::new(&path);
        assert!(store.read_all().unwrap().is_empty());
        store.remove().unwrap();

        fs::write(&path, "not valid json").unwrap();
        let err = store.read_all().unwrap_err();
        assert!(err.to_string().contains("unable to parse"));

        let cache = TtlCache::load(FileStore::new(&path), TTL, at(0));
        assert!(cache.is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn file_store_clear_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cache.json");

        let cache = TtlCache::load(FileStore::new(&path), TTL, at(0));
        cache.put("k", json!(1), at(0));
        cache.clear().unwrap();

        assert!(!path.exists());
    }
}
