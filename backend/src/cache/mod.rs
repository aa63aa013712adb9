//! Ingest cache - reuse parse results for identical uploads.
//!
//! Parsing is a pure function of the input bytes, so repeated uploads of the
//! same file (or refetches of an unchanged URL) can share one result. Entries
//! are keyed by a hash of the bytes and verified against the stored bytes, and
//! the oldest entry is evicted once capacity is reached.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::CsvResult;
use crate::parser::{parse_bytes_auto, ParseResult};

/// A cached parse result with the bytes it was computed from.
struct CachedParse {
    bytes: Vec<u8>,
    result: Arc<ParseResult>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<u64, CachedParse>,
    /// Insertion order, oldest first.
    order: VecDeque<u64>,
}

/// Bounded memoization of [`parse_bytes_auto`].
pub struct IngestCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl IngestCache {
    /// Create a cache holding at most `capacity` results. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the result for `bytes`.
    pub fn get(&self, bytes: &[u8]) -> Option<Arc<ParseResult>> {
        let key = hash_bytes(bytes);
        let state = self.lock();
        state
            .entries
            .get(&key)
            .filter(|entry| entry.bytes == bytes)
            .map(|entry| Arc::clone(&entry.result))
    }

    /// Store `result` for `bytes`, evicting the oldest entry when full.
    pub fn insert(&self, bytes: &[u8], result: ParseResult) -> Arc<ParseResult> {
        let result = Arc::new(result);
        if self.capacity == 0 {
            return result;
        }

        let key = hash_bytes(bytes);
        let mut state = self.lock();

        if state.entries.contains_key(&key) {
            state.order.retain(|k| *k != key);
        }
        while state.order.len() >= self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }

        state.entries.insert(
            key,
            CachedParse {
                bytes: bytes.to_vec(),
                result: Arc::clone(&result),
            },
        );
        state.order.push_back(key);
        result
    }

    /// Return the cached result for `bytes`, parsing on a miss.
    ///
    /// Failed parses are not cached.
    pub fn get_or_parse(&self, bytes: &[u8]) -> CsvResult<Arc<ParseResult>> {
        if let Some(hit) = self.get(bytes) {
            return Ok(hit);
        }
        let parsed = parse_bytes_auto(bytes)?;
        Ok(self.insert(bytes, parsed))
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for IngestCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_CAPACITY)
    }
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}
