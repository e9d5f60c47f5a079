//! Caching decorator behavior: idempotence, TTL expiry, invalidation,
//! empty-result handling, and failure pass-through.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{CountingSource, FailingSource};
use persondir_core::prelude::*;
use persondir_engine::cache::{CacheConfig, CachingResolver};
use persondir_engine::resolver::{AttributeResolver, Resolver};
use persondir_engine::sources::TableAttributeSource;

fn people_table() -> TableAttributeSource {
    TableAttributeSource::new("people").row(
        RawRecord::new()
            .with("uid", "jdoe")
            .with("mail", "jdoe@example.com"),
    )
}

fn counted_resolver(
    config: CacheConfig,
) -> (CachingResolver<AttributeResolver>, Arc<std::sync::atomic::AtomicUsize>) {
    let (counting, calls) = CountingSource::new(Arc::new(people_table()));
    let resolver = AttributeResolver::builder("uid")
        .source(SourceDescriptor::new("people", Arc::new(counting)))
        .build()
        .unwrap();
    (CachingResolver::new(resolver, config), calls)
}

#[tokio::test]
async fn repeated_query_hits_cache_with_zero_backend_calls() {
    let (resolver, calls) = counted_resolver(CacheConfig::default());
    let query = AttributeQuery::of("uid", "jdoe");

    let first = resolver.resolve(&query).await.unwrap();
    let second = resolver.resolve(&query).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn equivalent_queries_share_a_cache_entry() {
    let (resolver, calls) = counted_resolver(CacheConfig::default());

    // Same constraints, different construction order: the canonical
    // key sorts attribute names, so both land on one entry.
    let a = AttributeQuery::new().with("uid", "jdoe").with("dept", "eng");
    let b = AttributeQuery::new().with("dept", "eng").with("uid", "jdoe");

    resolver.resolve(&a).await.unwrap();
    resolver.resolve(&b).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ttl_expiry_triggers_reinvocation() {
    let (resolver, calls) = counted_resolver(CacheConfig {
        ttl: Duration::from_millis(100),
        ..CacheConfig::default()
    });
    let query = AttributeQuery::of("uid", "jdoe");

    resolver.resolve(&query).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    resolver.resolve(&query).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidate_forces_recomputation() {
    let (resolver, calls) = counted_resolver(CacheConfig::default());
    let query = AttributeQuery::of("uid", "jdoe");

    resolver.resolve(&query).await.unwrap();
    resolver.invalidate(&query).await;
    resolver.resolve(&query).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidate_all_forces_recomputation() {
    let (resolver, calls) = counted_resolver(CacheConfig::default());
    let query = AttributeQuery::of("uid", "jdoe");

    resolver.resolve(&query).await.unwrap();
    resolver.invalidate_all();
    resolver.resolve(&query).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_result_is_cached_by_default() {
    let (resolver, calls) = counted_resolver(CacheConfig::default());
    let query = AttributeQuery::of("uid", "nobody");

    let outcome = resolver.resolve(&query).await.unwrap();
    assert!(outcome.is_empty());

    resolver.resolve(&query).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retry_on_empty_recomputes_empty_outcomes() {
    let (resolver, calls) = counted_resolver(CacheConfig {
        retry_on_empty: true,
        ..CacheConfig::default()
    });
    let query = AttributeQuery::of("uid", "nobody");

    resolver.resolve(&query).await.unwrap();
    resolver.resolve(&query).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Non-empty outcomes are still served from cache.
    let hit = AttributeQuery::of("uid", "jdoe");
    resolver.resolve(&hit).await.unwrap();
    resolver.resolve(&hit).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn hard_failures_are_never_cached() {
    let (counting, calls) = CountingSource::new(Arc::new(FailingSource));
    let resolver = AttributeResolver::builder("uid")
        .source(SourceDescriptor::new("failing", Arc::new(counting)))
        .build()
        .unwrap();
    let resolver = CachingResolver::with_defaults(resolver);
    let query = AttributeQuery::of("uid", "jdoe");

    assert!(resolver.resolve(&query).await.is_err());
    assert!(resolver.resolve(&query).await.is_err());

    // Both calls reached the backend: the failure was not memoized.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(resolver.entry_count(), 0);
}

#[tokio::test]
async fn order_insensitive_value_keys() {
    let (resolver, calls) = counted_resolver(CacheConfig {
        order_insensitive_values: true,
        ..CacheConfig::default()
    });

    let a = AttributeQuery::new().with_values("uid", vec!["a".into(), "jdoe".into()]);
    let b = AttributeQuery::new().with_values("uid", vec!["jdoe".into(), "a".into()]);

    resolver.resolve(&a).await.unwrap();
    resolver.resolve(&b).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_composes_as_a_resolver_decorator() {
    // Double wrapping type-checks and behaves: the decorator shares the
    // Resolver contract with what it wraps.
    let (resolver, calls) = counted_resolver(CacheConfig::default());
    let outer = CachingResolver::with_defaults(resolver);
    let query = AttributeQuery::of("uid", "jdoe");

    outer.resolve(&query).await.unwrap();
    outer.resolve(&query).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
