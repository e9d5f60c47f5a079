//! The attribute-source capability trait and per-source configuration.
//!
//! Every backend — directory, relational, scripted, file-backed — is
//! reduced to one capability: given a query in its native vocabulary,
//! return zero or more raw records, or fail. The resolution engine
//! never branches on what kind of backend sits behind the trait.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SourceResult;
use crate::ids::SourceId;
use crate::mapping::AttributeMapping;
use crate::person::RawRecord;
use crate::query::AttributeQuery;

/// Default per-source timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A backend capable of answering attribute queries for people.
#[async_trait]
pub trait AttributeSource: Send + Sync {
    /// Human-readable name for diagnostics.
    fn display_name(&self) -> &str;

    /// Query the backend with a query in its native vocabulary.
    ///
    /// Returns the raw records that matched; an empty vec is a valid,
    /// successful answer.
    async fn query(&self, query: &AttributeQuery) -> SourceResult<Vec<RawRecord>>;
}

/// One configured attribute source plus everything the engine needs to
/// drive it: name-mapping tables, eligibility requirements, timeout,
/// and an enable flag.
///
/// Descriptors are immutable once the resolver is built; configuration
/// order is significant for merging.
#[derive(Clone)]
pub struct SourceDescriptor {
    id: SourceId,
    name: String,
    source: Arc<dyn AttributeSource>,
    mapping: AttributeMapping,
    required_attributes: HashSet<String>,
    timeout: Duration,
    enabled: bool,
}

impl SourceDescriptor {
    /// Create a descriptor for the given source with identity mapping,
    /// no required attributes, and the default timeout.
    pub fn new(name: impl Into<String>, source: Arc<dyn AttributeSource>) -> Self {
        Self {
            id: SourceId::new(),
            name: name.into(),
            source,
            mapping: AttributeMapping::new(),
            required_attributes: HashSet::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            enabled: true,
        }
    }

    /// Set the attribute-name mapping tables (builder).
    #[must_use]
    pub fn with_mapping(mut self, mapping: AttributeMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Require an attribute to be present in the query for this source
    /// to be eligible (builder). May be called multiple times.
    #[must_use]
    pub fn require(mut self, attribute: impl Into<String>) -> Self {
        self.required_attributes.insert(attribute.into());
        self
    }

    /// Set the per-source timeout (builder).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disable this source (builder). Disabled sources are skipped,
    /// never invoked, and reported as such.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Get the source id.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Get the configured display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the backing source.
    pub fn source(&self) -> &Arc<dyn AttributeSource> {
        &self.source
    }

    /// Get the mapping tables.
    pub fn mapping(&self) -> &AttributeMapping {
        &self.mapping
    }

    /// Get the required-attribute set (caller vocabulary).
    pub fn required_attributes(&self) -> &HashSet<String> {
        &self.required_attributes
    }

    /// Get the per-source timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check whether this source is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl std::fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("required_attributes", &self.required_attributes)
            .field("timeout", &self.timeout)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// What happened to one source during a resolution.
///
/// Failed, empty, and skipped are semantically distinct and all three
/// are preserved in the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// The source was invoked and returned this many records.
    Matched { records: usize },
    /// The source was invoked and returned no records (a successful,
    /// empty answer).
    Empty,
    /// The source was skipped because the query lacked a required
    /// attribute.
    Ineligible,
    /// The source is disabled in configuration.
    Disabled,
    /// The source failed or timed out.
    Failed {
        code: &'static str,
        message: String,
    },
}

impl SourceStatus {
    /// Check if the source was actually consulted (invoked and
    /// answered, even with zero records).
    pub fn was_consulted(&self) -> bool {
        matches!(self, SourceStatus::Matched { .. } | SourceStatus::Empty)
    }

    /// Check if this is a failure status.
    pub fn is_failure(&self) -> bool {
        matches!(self, SourceStatus::Failed { .. })
    }
}

/// Per-source annotation attached to a resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Id of the source this report is about.
    pub source: SourceId,
    /// Display name of the source.
    pub name: String,
    /// What happened.
    pub status: SourceStatus,
}
