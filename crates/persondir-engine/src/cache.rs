//! Caching resolver decorator.
//!
//! Wraps anything implementing [`Resolver`] with a moka-backed
//! memoization layer keyed by the canonical serialization of the
//! normalized query. Because it implements [`Resolver`] itself, the
//! cache composes freely: in front of the whole coordinator, or in
//! front of a single-source resolver inside a larger chain.
//!
//! Concurrency discipline: concurrent callers missing on the same key
//! recompute independently and the last write wins. The duplicate work
//! window is one resolution; the wrapped resolver already absorbs
//! per-source failures. Entries are typed in memory, so a stored
//! outcome cannot corrupt; expired or evicted entries are ordinary
//! misses.

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

use persondir_core::error::ResolveResult;
use persondir_core::query::AttributeQuery;

use crate::resolver::{ResolutionOutcome, Resolver};

/// Default maximum number of cached outcomes.
const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Default time-to-live for cached outcomes.
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Configuration for the caching resolver.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries; least-recently-used entries are
    /// evicted beyond this bound.
    pub max_entries: u64,

    /// Entry time-to-live. An entry older than this is evicted and the
    /// next identical query recomputes.
    pub ttl: Duration,

    /// Treat a cached empty outcome as a miss and recompute.
    ///
    /// By default an empty result is a valid, cacheable answer.
    pub retry_on_empty: bool,

    /// Sort value lists when forming the cache key, for callers whose
    /// value order is not semantically significant.
    pub order_insensitive_values: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: DEFAULT_TTL,
            retry_on_empty: false,
            order_insensitive_values: false,
        }
    }
}

/// Memoizing decorator around a [`Resolver`].
///
/// Hard failures are never cached; only successful outcomes (including
/// successful empty ones) are stored.
pub struct CachingResolver<R> {
    inner: R,
    cache: Cache<String, ResolutionOutcome>,
    config: CacheConfig,
}

impl<R: Resolver> CachingResolver<R> {
    /// Wrap a resolver with the given cache configuration.
    pub fn new(inner: R, config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self {
            inner,
            cache,
            config,
        }
    }

    /// Wrap a resolver with default cache configuration.
    pub fn with_defaults(inner: R) -> Self {
        Self::new(inner, CacheConfig::default())
    }

    /// Get a reference to the wrapped resolver.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Invalidate the cached outcome for one query, if present.
    pub async fn invalidate(&self, query: &AttributeQuery) {
        self.cache.invalidate(&self.key(query)).await;
    }

    /// Invalidate all cached outcomes.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Number of entries currently cached (approximate under
    /// concurrent writes).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    fn key(&self, query: &AttributeQuery) -> String {
        query
            .normalized()
            .canonical_key(self.config.order_insensitive_values)
    }
}

#[async_trait]
impl<R: Resolver> Resolver for CachingResolver<R> {
    async fn resolve(&self, query: &AttributeQuery) -> ResolveResult<ResolutionOutcome> {
        let key = self.key(query);

        if let Some(hit) = self.cache.get(&key).await {
            if self.config.retry_on_empty && hit.is_empty() {
                debug!(key = %key, "cached outcome is empty; recomputing");
            } else {
                debug!(key = %key, "cache hit");
                return Ok(hit);
            }
        }

        let outcome = self.inner.resolve(query).await?;
        self.cache.insert(key, outcome.clone()).await;
        Ok(outcome)
    }
}
