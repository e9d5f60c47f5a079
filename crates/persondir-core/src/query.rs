//! Attribute query types.
//!
//! A query is a mapping from attribute name to the list of values the
//! caller will accept for that attribute. Queries are multi-valued by
//! nature; the single name/value case is just a one-entry query.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// How multiple name/value constraints combine when a source natively
/// supports compound predicates.
///
/// Sources that cannot express `Or` reject the query per their own
/// contract ([`crate::error::SourceError::UnsupportedQuery`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// All constraints must match.
    #[default]
    And,
    /// Any constraint may match.
    Or,
}

impl QueryMode {
    /// Get the string representation used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::And => "and",
            QueryMode::Or => "or",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = ParseQueryModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "and" => Ok(QueryMode::And),
            "or" => Ok(QueryMode::Or),
            _ => Err(ParseQueryModeError(s.to_string())),
        }
    }
}

/// Error parsing query mode from string.
#[derive(Debug, Clone)]
pub struct ParseQueryModeError(String);

impl fmt::Display for ParseQueryModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid query mode '{}', expected one of: and, or", self.0)
    }
}

impl std::error::Error for ParseQueryModeError {}

/// A query for person attributes.
///
/// Attribute names are unique within a query; each name carries an
/// ordered list of acceptable values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeQuery {
    /// Map of attribute name to acceptable values.
    attributes: HashMap<String, Vec<String>>,

    /// How constraints combine for compound predicates.
    #[serde(default)]
    mode: QueryMode,
}

impl AttributeQuery {
    /// Create a new empty query with the default (`And`) mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single name/value query.
    pub fn of(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().with(name, value)
    }

    /// Add a single acceptable value for an attribute (builder).
    ///
    /// Appends to any values already present for the name.
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

    /// Set the query mode (builder).
    #[must_use]
    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Get the query mode.
    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// Get the acceptable values for an attribute.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Check if an attribute is present with at least one non-empty value.
    pub fn has_value(&self, name: &str) -> bool {
        self.attributes
            .get(name)
            .is_some_and(|values| values.iter().any(|v| !v.is_empty()))
    }

    /// Iterate over all attribute names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Iterate over all name/values entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.attributes.iter()
    }

    /// Get the number of attributes in the query.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the query has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Produce the normalized form of this query.
    ///
    /// Normalization drops attributes whose value list is empty or
    /// contains only empty strings, and strips empty-string values from
    /// the remaining lists. Value order is otherwise preserved. The
    /// result is what eligibility checks, sources, and cache keys see.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let attributes = self
            .attributes
            .iter()
            .filter_map(|(name, values)| {
                let kept: Vec<String> =
                    values.iter().filter(|v| !v.is_empty()).cloned().collect();
                if kept.is_empty() {
                    None
                } else {
                    Some((name.clone(), kept))
                }
            })
            .collect();

        Self {
            attributes,
            mode: self.mode,
        }
    }

    /// Canonical serialization of this query, used as a cache key.
    ///
    /// Attribute names are always sorted. Value lists are sorted when
    /// `order_insensitive_values` is set (for callers whose value order
    /// is not semantically significant), otherwise order-preserving.
    pub fn canonical_key(&self, order_insensitive_values: bool) -> String {
        let mut sorted: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, values) in &self.attributes {
            let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
            if order_insensitive_values {
                values.sort_unstable();
            }
            sorted.insert(name, values);
        }

        // BTreeMap serializes in key order, giving a deterministic key.
        let body = serde_json::to_string(&sorted).unwrap_or_default();
        format!("{}:{}", self.mode, body)
    }
}

impl FromIterator<(String, Vec<String>)> for AttributeQuery {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
            mode: QueryMode::default(),
        }
    }
}
