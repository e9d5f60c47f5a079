//! # persondir-engine
//!
//! The attribute-resolution engine: resolves a set of named attributes
//! for a person by querying an ordered collection of heterogeneous
//! sources and merging their answers into coherent person records.
//!
//! ## Architecture
//!
//! - [`AttributeResolver`](resolver::AttributeResolver) - the
//!   coordinator: normalizes the query, skips ineligible sources, fans
//!   out to the rest (sequentially or with bounded parallelism),
//!   absorbs per-source failures, and merges in configuration order
//! - [`MergePolicy`](merge::MergePolicy) - how sources' attributes
//!   combine for the same person: `none`, `replace`, or `multivalue`
//! - [`CachingResolver`](cache::CachingResolver) - a decorator sharing
//!   the [`Resolver`](resolver::Resolver) contract, memoizing outcomes
//!   with TTL + LRU bounds
//! - [`sources`] - in-memory sources for constant attributes and
//!   exact-match tables
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use persondir_core::prelude::*;
//! use persondir_engine::cache::CachingResolver;
//! use persondir_engine::merge::MergePolicy;
//! use persondir_engine::resolver::{AttributeResolver, Resolver};
//! use persondir_engine::sources::TableAttributeSource;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ResolveError> {
//! let people = TableAttributeSource::new("people")
//!     .row(RawRecord::new().with("uid", "jdoe").with("mail", "jdoe@example.com"));
//!
//! let resolver = AttributeResolver::builder("uid")
//!     .source(SourceDescriptor::new("people", Arc::new(people)).require("uid"))
//!     .merge_policy(MergePolicy::Replace)
//!     .build()?;
//! let resolver = CachingResolver::with_defaults(resolver);
//!
//! let outcome = resolver.resolve(&AttributeQuery::of("uid", "jdoe")).await?;
//! assert_eq!(outcome.records()[0].first("mail"), Some("jdoe@example.com"));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod merge;
pub mod resolver;
pub mod sources;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cache::{CacheConfig, CachingResolver};
    pub use crate::merge::{merge, MergePolicy};
    pub use crate::resolver::{
        AttributeResolver, FanOut, ResolutionOutcome, Resolver, ResolverBuilder,
    };
    pub use crate::sources::{StaticAttributeSource, TableAttributeSource};

    pub use persondir_core::prelude::*;
}
