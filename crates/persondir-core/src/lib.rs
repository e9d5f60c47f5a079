//! # persondir-core
//!
//! Core vocabulary for the persondir attribute-resolution engine.
//!
//! This crate defines the types shared between the resolution engine
//! and attribute-source implementations:
//!
//! - [`AttributeSource`](source::AttributeSource) - the single
//!   capability every backend is reduced to
//! - [`SourceDescriptor`](source::SourceDescriptor) - one configured
//!   source plus its mapping tables, eligibility requirements, timeout,
//!   and enable flag
//! - [`AttributeQuery`](query::AttributeQuery) /
//!   [`PersonRecord`](person::PersonRecord) - the query and result data
//!   model
//! - [`ResolveError`](error::ResolveError) - the error taxonomy with
//!   transient/permanent classification
//!
//! ## Crate organization
//!
//! - [`ids`] - type-safe identifiers
//! - [`query`] - attribute queries and query modes
//! - [`person`] - raw and resolved person records
//! - [`error`] - error types
//! - [`source`] - the source trait, descriptors, and outcome reports
//! - [`mapping`] - caller ↔ native attribute-name translation
//! - [`eligibility`] - per-source, per-query eligibility

pub mod eligibility;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod person;
pub mod query;
pub mod source;

/// Prelude module for convenient imports.
///
/// ```
/// use persondir_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::eligibility::is_eligible;
    pub use crate::error::{ResolveError, ResolveResult, SourceError, SourceResult};
    pub use crate::ids::SourceId;
    pub use crate::mapping::AttributeMapping;
    pub use crate::person::{PersonRecord, RawRecord};
    pub use crate::query::{AttributeQuery, QueryMode};
    pub use crate::source::{AttributeSource, SourceDescriptor, SourceReport, SourceStatus};
}

// Re-export async_trait for source implementors
pub use async_trait::async_trait;
