//! Built-in in-memory attribute sources.
//!
//! Useful on their own (constant-attribute providers, fallback chains)
//! and as deterministic backends in tests. Both speak the same
//! [`AttributeSource`] capability as any directory or relational
//! connector would.

use async_trait::async_trait;
use std::collections::HashMap;

use persondir_core::error::SourceResult;
use persondir_core::person::RawRecord;
use persondir_core::query::{AttributeQuery, QueryMode};
use persondir_core::source::AttributeSource;

/// A source that returns the same fixed attributes for every query.
///
/// Pair it with an empty required-attribute set to get an
/// unconditional constant-attribute provider, e.g. to stamp an
/// organization name onto every resolved person.
#[derive(Debug, Clone, Default)]
pub struct StaticAttributeSource {
    name: String,
    attributes: HashMap<String, Vec<String>>,
}

impl StaticAttributeSource {
    /// Create a new static source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add a single attribute value (builder).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Set the full value list for an attribute (builder).
    pub fn with_values(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }
}

#[async_trait]
impl AttributeSource for StaticAttributeSource {
    fn display_name(&self) -> &str {
        &self.name
    }

    async fn query(&self, _query: &AttributeQuery) -> SourceResult<Vec<RawRecord>> {
        if self.attributes.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![self.attributes.clone().into_iter().collect()])
    }
}

/// An in-memory table of attribute records matched by exact value
/// equality.
///
/// A row matches a query attribute when any of the query's acceptable
/// values equals any of the row's values for that attribute (rows
/// without the attribute never match it). Under [`QueryMode::And`]
/// every query attribute must match; under [`QueryMode::Or`] any one
/// suffices.
#[derive(Debug, Clone, Default)]
pub struct TableAttributeSource {
    name: String,
    rows: Vec<HashMap<String, Vec<String>>>,
    case_insensitive: bool,
}

impl TableAttributeSource {
    /// Create a new empty table source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            case_insensitive: false,
        }
    }

    /// Match values case-insensitively (builder).
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Add a row (builder).
    pub fn row(mut self, row: RawRecord) -> Self {
        self.rows.push(row.into_map());
        self
    }

    fn values_match(&self, accepted: &[String], present: &[String]) -> bool {
        accepted.iter().any(|a| {
            present.iter().any(|p| {
                if self.case_insensitive {
                    a.eq_ignore_ascii_case(p)
                } else {
                    a == p
                }
            })
        })
    }

    fn row_matches(&self, query: &AttributeQuery, row: &HashMap<String, Vec<String>>) -> bool {
        let mut constraints = query.iter().map(|(name, accepted)| {
            row.get(name)
                .is_some_and(|present| self.values_match(accepted, present))
        });

        match query.mode() {
            QueryMode::And => constraints.all(|matched| matched),
            QueryMode::Or => constraints.any(|matched| matched),
        }
    }
}

#[async_trait]
impl AttributeSource for TableAttributeSource {
    fn display_name(&self) -> &str {
        &self.name
    }

    async fn query(&self, query: &AttributeQuery) -> SourceResult<Vec<RawRecord>> {
        Ok(self
            .rows
            .iter()
            .filter(|row| self.row_matches(query, row))
            .map(|row| row.clone().into_iter().collect())
            .collect())
    }
}
