//! Person record types.
//!
//! [`RawRecord`] is what a backend source hands back: an untyped
//! mapping from *native* attribute name to values. [`PersonRecord`] is
//! the resolved form in the caller's vocabulary, pinned to an
//! identifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An untyped attribute record in a source's native vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Map of native attribute name to values.
    #[serde(flatten)]
    attributes: HashMap<String, Vec<String>>,
}

impl RawRecord {
    /// Create a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single value for an attribute (builder).
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

    /// Get the values for an attribute.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Check if the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over all name/values entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.attributes.iter()
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> HashMap<String, Vec<String>> {
        self.attributes
    }
}

impl FromIterator<(String, Vec<String>)> for RawRecord {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// The resolved attribute set for one identified person.
///
/// Attribute names are unique within a record and are in the caller's
/// vocabulary (post inbound mapping). Value lists are ordered; whether
/// they carry duplicates depends on the merge policy that produced the
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// The identifier value for this person.
    id: String,

    /// Map of attribute name to ordered values.
    attributes: HashMap<String, Vec<String>>,
}

impl PersonRecord {
    /// Create a new record for the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Get the identifier value.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a single value for an attribute (builder).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, vec![value.into()]);
        self
    }

    /// Set the full value list for an attribute, replacing any existing
    /// values.
    pub fn set(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.attributes.insert(name.into(), values);
    }

    /// Append values to an attribute, preserving existing values and
    /// order.
    pub fn append(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.attributes.entry(name.into()).or_default().extend(values);
    }

    /// Get the values for an attribute.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Get the first value for an attribute.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// Check if an attribute exists.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Iterate over all attribute names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Iterate over all name/values entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.attributes.iter()
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the record carries no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
