//! Source eligibility.
//!
//! A source is worth invoking only when the query carries enough
//! information for it. Skipping an ineligible source is not an error.

use tracing::debug;

use crate::query::AttributeQuery;
use crate::source::SourceDescriptor;

/// Decide whether a source should be invoked for a query.
///
/// A source is eligible iff every attribute name it requires is present
/// in the query with at least one non-empty value. Sources with an
/// empty requirement set are always eligible (unconditional sources,
/// e.g. constant-attribute providers). Disabled sources are never
/// eligible.
pub fn is_eligible(query: &AttributeQuery, descriptor: &SourceDescriptor) -> bool {
    if !descriptor.is_enabled() {
        return false;
    }

    for required in descriptor.required_attributes() {
        if !query.has_value(required) {
            debug!(
                source = %descriptor.name(),
                required = %required,
                "skipping source: required attribute missing from query"
            );
            return false;
        }
    }
    true
}
