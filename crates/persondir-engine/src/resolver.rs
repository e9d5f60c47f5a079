//! The resolution coordinator.
//!
//! Normalizes a query once, fans it out to the eligible sources in
//! configuration order, maps names in both directions, absorbs
//! per-source failures, and hands the ordered per-source record sets
//! to the merge engine.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use persondir_core::eligibility::is_eligible;
use persondir_core::error::{ResolveError, ResolveResult};
use persondir_core::person::{PersonRecord, RawRecord};
use persondir_core::query::{AttributeQuery, QueryMode};
use persondir_core::source::{SourceDescriptor, SourceReport, SourceStatus};

use crate::merge::{merge, MergePolicy};

/// How eligible sources are invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// One source at a time, in configuration order.
    Sequential,
    /// Up to `max_in_flight` sources at a time. Results are still
    /// collected in configuration order, so merge semantics are
    /// unaffected by completion order.
    Concurrent { max_in_flight: usize },
}

impl Default for FanOut {
    fn default() -> Self {
        FanOut::Sequential
    }
}

/// The result of one resolution: the merged record set plus a report
/// for every configured source.
///
/// Failed, empty, and skipped sources are semantically distinct; the
/// reports preserve all three even when resolution succeeds with
/// partial data.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    records: Vec<PersonRecord>,
    reports: Vec<SourceReport>,
}

impl ResolutionOutcome {
    /// Get the merged person records.
    pub fn records(&self) -> &[PersonRecord] {
        &self.records
    }

    /// Consume into the merged person records.
    pub fn into_records(self) -> Vec<PersonRecord> {
        self.records
    }

    /// Get the per-source reports, in configuration order.
    pub fn reports(&self) -> &[SourceReport] {
        &self.reports
    }

    /// Get the reports for sources that failed during this resolution.
    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| r.status.is_failure())
    }

    /// Check if the resolution matched no people.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The resolution contract.
///
/// Implemented by the coordinator itself and by decorators wrapping it
/// (e.g. the caching resolver), so the two compose freely.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a query into person records.
    ///
    /// The query may carry multiple acceptable values per attribute
    /// name (an OR-style candidate match in one call).
    async fn resolve(&self, query: &AttributeQuery) -> ResolveResult<ResolutionOutcome>;
}

/// Builder for [`AttributeResolver`].
///
/// All configuration validation happens in [`build`](Self::build);
/// a resolver that constructs successfully never fails a query with a
/// configuration error.
pub struct ResolverBuilder {
    descriptors: Vec<SourceDescriptor>,
    policy: MergePolicy,
    id_attribute: String,
    fan_out: FanOut,
}

impl ResolverBuilder {
    /// Create a builder with the given identifier attribute (caller
    /// vocabulary). Records missing this attribute after inbound
    /// mapping are dropped.
    pub fn new(id_attribute: impl Into<String>) -> Self {
        Self {
            descriptors: Vec::new(),
            policy: MergePolicy::default(),
            id_attribute: id_attribute.into(),
            fan_out: FanOut::default(),
        }
    }

    /// Append a source descriptor. Order of calls is configuration
    /// order and is significant for merging.
    #[must_use]
    pub fn source(mut self, descriptor: SourceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Set the merge policy.
    #[must_use]
    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the fan-out mode.
    #[must_use]
    pub fn fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Validate the configuration and build the resolver.
    pub fn build(self) -> ResolveResult<AttributeResolver> {
        if self.id_attribute.is_empty() {
            return Err(ResolveError::invalid_configuration(
                "identifier attribute must not be empty",
            ));
        }
        if self.descriptors.is_empty() {
            return Err(ResolveError::invalid_configuration(
                "at least one attribute source must be configured",
            ));
        }
        if let FanOut::Concurrent { max_in_flight } = self.fan_out {
            if max_in_flight == 0 {
                return Err(ResolveError::invalid_configuration(
                    "concurrent fan-out requires max_in_flight >= 1",
                ));
            }
        }
        for descriptor in &self.descriptors {
            descriptor.mapping().validate().map_err(|e| {
                ResolveError::invalid_configuration(format!(
                    "source '{}': {e}",
                    descriptor.name()
                ))
            })?;
            if descriptor.timeout().is_zero() {
                return Err(ResolveError::invalid_configuration(format!(
                    "source '{}': timeout must be non-zero",
                    descriptor.name()
                )));
            }
        }

        Ok(AttributeResolver {
            descriptors: self.descriptors,
            policy: self.policy,
            id_attribute: self.id_attribute,
            fan_out: self.fan_out,
        })
    }
}

/// The resolution coordinator.
///
/// Configuration is immutable after construction; the resolver is
/// cheap to share behind an `Arc`. Dropping the future returned by
/// [`resolve`](Resolver::resolve) cancels all in-flight source calls.
#[derive(Debug)]
pub struct AttributeResolver {
    descriptors: Vec<SourceDescriptor>,
    policy: MergePolicy,
    id_attribute: String,
    fan_out: FanOut,
}

impl AttributeResolver {
    /// Start building a resolver.
    pub fn builder(id_attribute: impl Into<String>) -> ResolverBuilder {
        ResolverBuilder::new(id_attribute)
    }

    /// Get the configured merge policy.
    pub fn merge_policy(&self) -> MergePolicy {
        self.policy
    }

    /// Get the identifier attribute name.
    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }

    /// Resolve a single name/value query.
    pub async fn resolve_one(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        mode: QueryMode,
    ) -> ResolveResult<ResolutionOutcome> {
        let query = AttributeQuery::of(name, value).with_mode(mode);
        self.resolve(&query).await
    }

    /// Invoke one source: map the query out, query with the
    /// per-source deadline, map the results back in.
    async fn invoke_source(
        &self,
        descriptor: &SourceDescriptor,
        query: &AttributeQuery,
    ) -> ResolveResult<Vec<PersonRecord>> {
        let native = descriptor.mapping().map_query_out(query);

        let raws = match tokio::time::timeout(
            descriptor.timeout(),
            descriptor.source().query(&native),
        )
        .await
        {
            Err(_) => {
                return Err(ResolveError::source_timeout(
                    descriptor.id(),
                    descriptor.timeout(),
                ))
            }
            Ok(Err(e)) => {
                return Err(ResolveError::source_unavailable(
                    descriptor.id(),
                    e.to_string(),
                ))
            }
            Ok(Ok(raws)) => raws,
        };

        Ok(raws
            .iter()
            .filter_map(|raw| self.to_person(descriptor, raw))
            .collect())
    }

    /// Map a raw record into the caller vocabulary and pin it to an
    /// identifier. Records without a resolvable identifier are dropped.
    fn to_person(&self, descriptor: &SourceDescriptor, raw: &RawRecord) -> Option<PersonRecord> {
        let mapped = descriptor.mapping().map_result_in(raw);

        let id = match mapped
            .get(&self.id_attribute)
            .and_then(|values| values.iter().find(|v| !v.is_empty()))
        {
            Some(id) => id.clone(),
            None => {
                warn!(
                    source = %descriptor.name(),
                    id_attribute = %self.id_attribute,
                    "dropping record without identifier attribute"
                );
                return None;
            }
        };

        let mut person = PersonRecord::new(id);
        for (name, values) in mapped.iter() {
            person.set(name.clone(), values.clone());
        }
        Some(person)
    }
}

#[async_trait]
impl Resolver for AttributeResolver {
    async fn resolve(&self, query: &AttributeQuery) -> ResolveResult<ResolutionOutcome> {
        let normalized = query.normalized();
        if normalized.is_empty() {
            return Err(ResolveError::invalid_query(
                "query has no attributes with non-empty values",
            ));
        }

        // Partition into skipped and eligible, preserving configuration
        // order. Skips are recorded, not errors.
        let mut skipped: Vec<(usize, SourceStatus)> = Vec::new();
        let mut eligible: Vec<(usize, &SourceDescriptor)> = Vec::new();
        for (idx, descriptor) in self.descriptors.iter().enumerate() {
            if !descriptor.is_enabled() {
                debug!(source = %descriptor.name(), "skipping disabled source");
                skipped.push((idx, SourceStatus::Disabled));
            } else if !is_eligible(&normalized, descriptor) {
                skipped.push((idx, SourceStatus::Ineligible));
            } else {
                eligible.push((idx, descriptor));
            }
        }

        // Invoke eligible sources. Concurrent fan-out still yields
        // results in submission order, so the merge below always sees
        // configuration order.
        let invocations: Vec<_> = eligible
            .iter()
            .copied()
            .map(|(idx, descriptor)| {
                let normalized = &normalized;
                async move { (idx, descriptor, self.invoke_source(descriptor, normalized).await) }
            })
            .collect();
        let results: Vec<(usize, &SourceDescriptor, ResolveResult<Vec<PersonRecord>>)> =
            match self.fan_out {
                FanOut::Sequential => {
                    let mut results = Vec::with_capacity(eligible.len());
                    for invocation in invocations {
                        results.push(invocation.await);
                    }
                    results
                }
                FanOut::Concurrent { max_in_flight } => {
                    stream::iter(invocations)
                        .buffered(max_in_flight)
                        .collect()
                        .await
                }
            };

        // Assemble reports in configuration order and collect the
        // per-source record sets from the sources that answered.
        let mut statuses: Vec<(usize, SourceStatus)> = skipped;
        let mut per_source: Vec<(usize, Vec<PersonRecord>)> = Vec::new();
        let mut consulted = 0usize;
        for (idx, descriptor, result) in results {
            let status = match result {
                Ok(records) => {
                    consulted += 1;
                    let status = if records.is_empty() {
                        SourceStatus::Empty
                    } else {
                        SourceStatus::Matched {
                            records: records.len(),
                        }
                    };
                    per_source.push((idx, records));
                    status
                }
                Err(e) => {
                    warn!(
                        source = %descriptor.name(),
                        error = %e,
                        "attribute source failed; continuing with remaining sources"
                    );
                    SourceStatus::Failed {
                        code: e.error_code(),
                        message: e.to_string(),
                    }
                }
            };
            statuses.push((idx, status));
        }

        statuses.sort_by_key(|&(idx, _)| idx);
        let reports: Vec<SourceReport> = statuses
            .into_iter()
            .map(|(idx, status)| SourceReport {
                source: self.descriptors[idx].id(),
                name: self.descriptors[idx].name().to_string(),
                status,
            })
            .collect();

        // Only when no source could be consulted at all does the
        // resolution fail hard.
        if consulted == 0 {
            return Err(ResolveError::NoSourcesAvailable { reports });
        }

        per_source.sort_by_key(|&(idx, _)| idx);
        let records = merge(
            self.policy,
            per_source.into_iter().map(|(_, records)| records).collect(),
        );

        Ok(ResolutionOutcome { records, reports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persondir_core::error::SourceResult;
    use persondir_core::mapping::AttributeMapping;
    use persondir_core::source::AttributeSource;
    use std::sync::Arc;
    use std::time::Duration;

    struct EmptySource;

    #[async_trait]
    impl AttributeSource for EmptySource {
        fn display_name(&self) -> &str {
            "empty"
        }

        async fn query(&self, _query: &AttributeQuery) -> SourceResult<Vec<RawRecord>> {
            Ok(vec![])
        }
    }

    fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new("empty", Arc::new(EmptySource))
    }

    #[test]
    fn test_build_requires_a_source() {
        let err = AttributeResolver::builder("username").build().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_build_requires_id_attribute() {
        let err = AttributeResolver::builder("")
            .source(descriptor())
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_build_rejects_zero_timeout() {
        let err = AttributeResolver::builder("username")
            .source(descriptor().with_timeout(Duration::ZERO))
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_build_rejects_zero_parallelism() {
        let err = AttributeResolver::builder("username")
            .source(descriptor())
            .fan_out(FanOut::Concurrent { max_in_flight: 0 })
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_build_rejects_colliding_mapping() {
        let mapping = AttributeMapping::new()
            .query_attribute("username", "uid")
            .query_attribute("login", "uid");
        let err = AttributeResolver::builder("username")
            .source(descriptor().with_mapping(mapping))
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let resolver = AttributeResolver::builder("username")
            .source(descriptor())
            .build()
            .unwrap();

        let err = resolver.resolve(&AttributeQuery::new()).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_QUERY");
    }
}
