//! Attribute name mapping between caller and source vocabularies.
//!
//! Each source descriptor carries an [`AttributeMapping`] that renames
//! query attributes on the way out (caller name → native name) and
//! result attributes on the way back in (native name → caller name).
//! Both transforms are pure.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{ResolveError, ResolveResult};
use crate::person::RawRecord;
use crate::query::AttributeQuery;

/// Bidirectional attribute-name mapping tables for one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeMapping {
    /// Outbound table: caller attribute name → source-native name.
    #[serde(default)]
    pub query_attributes: HashMap<String, String>,

    /// Inbound table: source-native name → caller attribute name.
    #[serde(default)]
    pub result_attributes: HashMap<String, String>,

    /// When set, result attributes with no inbound mapping entry are
    /// passed through under their native name instead of being dropped.
    #[serde(default)]
    pub pass_through_unmapped: bool,
}

impl AttributeMapping {
    /// Create an empty (identity) mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an outbound query-attribute mapping (builder).
    pub fn query_attribute(
        mut self,
        caller: impl Into<String>,
        native: impl Into<String>,
    ) -> Self {
        self.query_attributes.insert(caller.into(), native.into());
        self
    }

    /// Add an inbound result-attribute mapping (builder).
    pub fn result_attribute(
        mut self,
        native: impl Into<String>,
        caller: impl Into<String>,
    ) -> Self {
        self.result_attributes.insert(native.into(), caller.into());
        self
    }

    /// Pass unmapped result attributes through unchanged (builder).
    #[must_use]
    pub fn pass_through_unmapped(mut self) -> Self {
        self.pass_through_unmapped = true;
        self
    }

    /// Translate a caller query into the source's native vocabulary.
    ///
    /// Names with no mapping entry pass through unchanged.
    pub fn map_query_out(&self, query: &AttributeQuery) -> AttributeQuery {
        query
            .iter()
            .map(|(name, values)| {
                let native = self
                    .query_attributes
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| name.clone());
                (native, values.clone())
            })
            .collect::<AttributeQuery>()
            .with_mode(query.mode())
    }

    /// Translate a raw source record into the caller's vocabulary.
    ///
    /// Names with no inbound mapping are dropped unless
    /// `pass_through_unmapped` is set.
    pub fn map_result_in(&self, raw: &RawRecord) -> RawRecord {
        raw.iter()
            .filter_map(|(native, values)| match self.result_attributes.get(native) {
                Some(caller) => Some((caller.clone(), values.clone())),
                None if self.pass_through_unmapped => Some((native.clone(), values.clone())),
                None => None,
            })
            .collect()
    }

    /// Validate the mapping tables.
    ///
    /// Two caller names mapping to the same native name (or two native
    /// names to the same caller name) would silently collapse
    /// attributes, so both are rejected at configuration time.
    pub fn validate(&self) -> ResolveResult<()> {
        check_injective(&self.query_attributes, "query attribute mapping")?;
        check_injective(&self.result_attributes, "result attribute mapping")?;
        Ok(())
    }
}

fn check_injective(table: &HashMap<String, String>, what: &str) -> ResolveResult<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(table.len());
    for target in table.values() {
        if !seen.insert(target.as_str()) {
            return Err(ResolveError::invalid_configuration(format!(
                "{what} maps multiple names to '{target}'"
            )));
        }
    }
    Ok(())
}
