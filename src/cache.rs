//! Query cache seam.
//!
//! The cache that backs the screens belongs to the host. This layer only
//! needs `read`, `write` and `invalidate`, expressed by [`QueryCache`].
//! [`MemoryQueryCache`] is a reference implementation: invalidation keeps
//! the value but marks it stale and announces the pattern on a broadcast
//! channel so subscribers can re-fetch.

use crate::error::{classify, ApiResult};
use crate::logging::log_trace;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::Instant;
use tokio::sync::broadcast;

/// Hierarchical cache key. Invalidation patterns match by prefix, so
/// invalidating `["recipes"]` also covers `["recipes", "5"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn child(&self, segment: impl ToString) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `self` falls under `pattern`.
    pub fn matches(&self, pattern: &QueryKey) -> bool {
        self.0.starts_with(&pattern.0)
    }

    pub fn favorites() -> Self {
        Self::new(["favorites"])
    }

    pub fn recipes() -> Self {
        Self::new(["recipes"])
    }

    pub fn recipe(id: i64) -> Self {
        Self::recipes().child(id)
    }

    pub fn categories() -> Self {
        Self::new(["categories"])
    }

    pub fn users() -> Self {
        Self::new(["users"])
    }

    pub fn tags() -> Self {
        Self::new(["tags"])
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// The three operations the mutation coordinator uses.
pub trait QueryCache: Send + Sync {
    fn read(&self, key: &QueryKey) -> Option<Value>;

    fn write(&self, key: &QueryKey, value: Value);

    /// Mark every entry under `pattern` stale.
    fn invalidate(&self, pattern: &QueryKey);
}

/// Typed access on top of any [`QueryCache`].
pub trait QueryCacheExt: QueryCache {
    /// Read and decode an entry. Entries that do not decode as `T` read as absent.
    fn read_as<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        self.read(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    fn write_as<T: Serialize + ?Sized>(&self, key: &QueryKey, value: &T) -> ApiResult<()> {
        let value = serde_json::to_value(value).map_err(classify)?;
        self.write(key, value);
        Ok(())
    }
}

impl<C: QueryCache + ?Sized> QueryCacheExt for C {}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stale: bool,
    updated_at: Instant,
}

/// In-process [`QueryCache`] with stale tracking.
#[derive(Debug)]
pub struct MemoryQueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    invalidations: broadcast::Sender<QueryKey>,
}

impl Default for MemoryQueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueryCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(64);
        Self {
            entries: RwLock::new(HashMap::new()),
            invalidations,
        }
    }

    /// Receive every invalidated pattern from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidations.subscribe()
    }

    /// Missing entries count as stale: the next read must fetch.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .map_or(true, |entry| entry.stale)
    }

    /// When the entry was last written.
    pub fn updated_at(&self, key: &QueryKey) -> Option<Instant> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .map(|entry| entry.updated_at)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueryCache for MemoryQueryCache {
    fn read(&self, key: &QueryKey) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .map(|entry| entry.value.clone())
    }

    fn write(&self, key: &QueryKey, value: Value) {
        log_trace!(key = %key, "Cache write");
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                key.clone(),
                CacheEntry {
                    value,
                    stale: false,
                    updated_at: Instant::now(),
                },
            );
    }

    fn invalidate(&self, pattern: &QueryKey) {
        let mut marked = 0usize;
        {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for (key, entry) in entries.iter_mut() {
                if key.matches(pattern) {
                    entry.stale = true;
                    marked += 1;
                }
            }
        }

        log_trace!(pattern = %pattern, entries = marked, "Cache invalidated");
        // No subscribers is fine.
        let _ = self.invalidations.send(pattern.clone());
    }
}
