//! Bounded cache of SCM clients keyed by toolkit installation path.
//!
//! Building a client means spinning up a toolkit facade, which is expensive,
//! so hosts share one cache across jobs. The cache is an injected value
//! (construct it once and pass it where needed) with explicit LRU eviction:
//! least recently used first, access refreshes recency.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::client::ScmClient;
use crate::error::ClientError;

/// Default number of clients kept alive.
pub const DEFAULT_FACADE_CAPACITY: usize = 3;

/// Bounded key→client cache with LRU eviction.
///
/// Keys are normalized toolkit paths, so `/opt/toolkit/` and `/opt/./toolkit`
/// share an entry. The factory handed to [`FacadeCache::get_or_create`] may
/// fail independently of cache state (toolkit missing, version probe failed);
/// a failed factory inserts nothing.
pub struct FacadeCache {
    capacity: usize,
    // Recency order: index 0 is the eviction candidate.
    entries: Mutex<Vec<(String, Arc<dyn ScmClient>)>>,
}

impl FacadeCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FACADE_CAPACITY)
    }

    /// Capacity 0 is clamped to 1; a cache that can hold nothing would turn
    /// every lookup into a rebuild.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Fetch the client for `toolkit_path`, building it on a miss.
    ///
    /// The factory runs with the cache unlocked, so one slow construction
    /// never stalls hits on other paths. Two callers can miss on the same
    /// key concurrently; whichever insert lands first wins and the other
    /// caller gets the already-cached client, dropping its own build.
    pub fn get_or_create<F>(
        &self,
        toolkit_path: &Path,
        build: F,
    ) -> Result<Arc<dyn ScmClient>, ClientError>
    where
        F: FnOnce() -> Result<Arc<dyn ScmClient>, ClientError>,
    {
        let key = normalize_toolkit_path(toolkit_path);
        if let Some(client) = self.touch(&key) {
            return Ok(client);
        }

        let client = build()?;

        let mut entries = self.entries.lock().unwrap();
        if let Some(position) = entries.iter().position(|(k, _)| *k == key) {
            // Another caller inserted this key while the factory ran.
            let entry = entries.remove(position);
            let existing = entry.1.clone();
            entries.push(entry);
            return Ok(existing);
        }
        entries.push((key, client.clone()));
        if entries.len() > self.capacity {
            let evicted = entries.remove(0);
            debug!(event = "facade.evicted", toolkit_path = %evicted.0);
        }
        Ok(client)
    }

    /// Refresh the recency of `key` and return its client, if cached.
    fn touch(&self, key: &str) -> Option<Arc<dyn ScmClient>> {
        let mut entries = self.entries.lock().unwrap();
        let position = entries.iter().position(|(k, _)| *k == key)?;
        let entry = entries.remove(position);
        let client = entry.1.clone();
        entries.push(entry);
        Some(client)
    }

    /// Drop the entry for `toolkit_path`, if present.
    pub fn invalidate(&self, toolkit_path: &Path) {
        let key = normalize_toolkit_path(toolkit_path);
        self.entries.lock().unwrap().retain(|(k, _)| *k != key);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached keys in eviction order, least recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl Default for FacadeCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a toolkit path for use as a cache key: collapse `.` segments and
/// redundant separators without touching `..` (resolving those needs the
/// filesystem, and two spellings of the same installation path in one host
/// configuration is the case that actually occurs).
fn normalize_toolkit_path(path: &Path) -> String {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized.to_string_lossy().into_owned()
}
