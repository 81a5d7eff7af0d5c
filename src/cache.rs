//! Route resolution caching.
//!
//! [`MatchCache`] is an LRU cache (from the [`lru`] crate) mapping a normalized
//! pathname to its resolved branch, so repeated navigations to the same path
//! skip the tree walk. It is gated behind the `cache` feature.
//!
//! Misses are cached too: a path that matched nothing keeps matching nothing
//! because the route tree is immutable.
//!
//! [`CacheStats`] tracks hits, misses and invalidations.
//!
//! # Examples
//!
//! ```
//! use data_navigator::cache::MatchCache;
//!
//! let mut cache = MatchCache::new();
//! assert!(cache.get("/users").is_none());
//! cache.insert("/users".to_string(), None);
//! assert!(matches!(cache.get("/users"), Some(None)));
//! assert_eq!(cache.stats().hits, 1);
//! assert_eq!(cache.stats().misses, 1);
//! ```

use crate::resolve::MatchedRoute;
use crate::{debug_log, trace_log};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Cached branch for one pathname; `None` records "no match".
pub type CachedMatch = Option<Arc<[MatchedRoute]>>;

/// Counters tracking cache effectiveness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: usize,
    /// Number of lookups that had to resolve.
    pub misses: usize,
    /// Number of full cache invalidations (via [`MatchCache::clear`]).
    pub invalidations: usize,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`; `0.0` before any lookup.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of match results keyed by pathname.
#[derive(Debug)]
pub struct MatchCache {
    entries: LruCache<String, CachedMatch>,
    stats: CacheStats,
}

impl MatchCache {
    /// Default capacity when none is configured.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Create a cache with [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY).
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache holding up to `capacity` paths. Zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    /// Look up a pathname. The outer `Option` is the cache hit.
    pub fn get(&mut self, pathname: &str) -> Option<CachedMatch> {
        if let Some(found) = self.entries.get(pathname) {
            self.stats.hits += 1;
            trace_log!("Match cache hit for '{}'", pathname);
            Some(found.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Match cache miss for '{}'", pathname);
            None
        }
    }

    /// Store the resolution result for a pathname.
    pub fn insert(&mut self, pathname: String, matches: CachedMatch) {
        self.entries.push(pathname, matches);
    }

    /// Drop every entry and count an invalidation.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "Match cache cleared: {} entries removed (hit rate: {:.1}%)",
            removed,
            self.stats.hit_rate() * 100.0
        );
    }

    /// Current statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new()
    }
}
