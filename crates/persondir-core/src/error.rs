//! Error types for attribute resolution.
//!
//! Two layers, with transient/permanent classification for both:
//!
//! - [`SourceError`] is what a backend source returns from its single
//!   `query` capability.
//! - [`ResolveError`] is what the resolution engine surfaces. Per-source
//!   failures are absorbed into outcome reports and never propagate
//!   individually; only the aggregate [`ResolveError::NoSourcesAvailable`]
//!   condition reaches the caller.

use thiserror::Error;

use crate::ids::SourceId;
use crate::source::SourceReport;

/// Error returned by an attribute source's `query` operation.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source failed to respond or threw during invocation.
    #[error("source unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The source cannot express the query (e.g. an `Or` predicate
    /// against a backend that only supports conjunctions).
    #[error("unsupported query: {message}")]
    UnsupportedQuery { message: String },
}

impl SourceError {
    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        SourceError::Unavailable {
            message: message.into(),
            cause: None,
        }
    }

    /// Create an unavailable error with the underlying cause.
    pub fn unavailable_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SourceError::Unavailable {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Create an unsupported-query error.
    pub fn unsupported_query(message: impl Into<String>) -> Self {
        SourceError::UnsupportedQuery {
            message: message.into(),
        }
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            SourceError::Unavailable { .. } => "SOURCE_UNAVAILABLE",
            SourceError::UnsupportedQuery { .. } => "UNSUPPORTED_QUERY",
        }
    }
}

/// Result type for attribute source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Error surfaced by the resolution engine.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A source failed to respond or threw during invocation.
    ///
    /// Recorded per source; non-fatal for the overall resolution.
    #[error("source '{source_id}' unavailable: {message}")]
    SourceUnavailable { source_id: SourceId, message: String },

    /// A source exceeded its configured deadline.
    ///
    /// Treated identically to [`ResolveError::SourceUnavailable`].
    #[error("source '{source_id}' timed out after {timeout_ms} ms")]
    SourceTimeout { source_id: SourceId, timeout_ms: u64 },

    /// A source descriptor or engine setting is malformed.
    ///
    /// Detected when the resolver is built, never per-query.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The query itself is empty or malformed.
    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    /// Every configured source was ineligible, disabled, or failed.
    ///
    /// Distinct from a successful resolution with zero matching people.
    /// Carries the per-source reports for diagnostics.
    #[error("no attribute source could be consulted ({} configured)", reports.len())]
    NoSourcesAvailable { reports: Vec<SourceReport> },
}

impl ResolveError {
    /// Check if this error is transient and the operation may succeed
    /// on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResolveError::SourceUnavailable { .. }
                | ResolveError::SourceTimeout { .. }
                | ResolveError::NoSourcesAvailable { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ResolveError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            ResolveError::SourceTimeout { .. } => "SOURCE_TIMEOUT",
            ResolveError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ResolveError::InvalidQuery { .. } => "INVALID_QUERY",
            ResolveError::NoSourcesAvailable { .. } => "NO_SOURCES_AVAILABLE",
        }
    }

    // Convenience constructors

    /// Create a source-unavailable error.
    pub fn source_unavailable(source: SourceId, message: impl Into<String>) -> Self {
        ResolveError::SourceUnavailable {
            source_id: source,
            message: message.into(),
        }
    }

    /// Create a source-timeout error.
    pub fn source_timeout(source: SourceId, timeout: std::time::Duration) -> Self {
        ResolveError::SourceTimeout {
            source_id: source,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ResolveError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an invalid-query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        ResolveError::InvalidQuery {
            message: message.into(),
        }
    }
}

/// Result type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
