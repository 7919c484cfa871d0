//! Cache of compiled keyword queries
use crate::search::keywords::{keywords_to_pattern, KeywordError, KeywordQuery};
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

/// Cache key for compiled queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub pattern: String,
    pub size_limit: usize,
}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
        self.size_limit.hash(state);
    }
}

/// LRU of compiled queries. Failed compilations are cached too, so a bad
/// pattern typed repeatedly is only reported once.
pub struct PatternCache {
    entries: Mutex<LruCache<CacheKey, Result<KeywordQuery, KeywordError>>>,
    capacity: usize,
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            capacity,
        }
    }

    /// Returns the compiled query, compiling and caching it on a miss.
    pub fn get_or_compile(
        &self,
        pattern: &str,
        size_limit: usize,
    ) -> Result<KeywordQuery, KeywordError> {
        let key = CacheKey {
            pattern: pattern.to_string(),
            size_limit,
        };

        if let Some(hit) = self.entries.lock().get(&key) {
            return hit.clone();
        }

        let compiled = keywords_to_pattern(pattern, size_limit);
        self.entries.lock().put(key, compiled.clone());
        compiled
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn get_stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.lock().len(),
            capacity: self.capacity,
        }
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}
