//! Shared test sources.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use persondir_core::error::{SourceError, SourceResult};
use persondir_core::person::RawRecord;
use persondir_core::query::AttributeQuery;
use persondir_core::source::AttributeSource;

/// Wraps a source and counts how many times its backend is invoked.
pub struct CountingSource {
    inner: Arc<dyn AttributeSource>,
    calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(inner: Arc<dyn AttributeSource>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl AttributeSource for CountingSource {
    fn display_name(&self) -> &str {
        self.inner.display_name()
    }

    async fn query(&self, query: &AttributeQuery) -> SourceResult<Vec<RawRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.query(query).await
    }
}

/// A source that always fails.
pub struct FailingSource;

#[async_trait]
impl AttributeSource for FailingSource {
    fn display_name(&self) -> &str {
        "failing"
    }

    async fn query(&self, _query: &AttributeQuery) -> SourceResult<Vec<RawRecord>> {
        Err(SourceError::unavailable("backend down"))
    }
}

/// A source that sleeps before answering with a fixed record.
pub struct SlowSource {
    pub delay: Duration,
    pub record: RawRecord,
}

#[async_trait]
impl AttributeSource for SlowSource {
    fn display_name(&self) -> &str {
        "slow"
    }

    async fn query(&self, _query: &AttributeQuery) -> SourceResult<Vec<RawRecord>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![self.record.clone()])
    }
}
