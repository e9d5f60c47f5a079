//! Merge policies and the merge engine.
//!
//! Combines per-source result sets into the final record set. Input
//! order is source configuration order and is significant for every
//! policy; output order is the order identifiers were first seen.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use persondir_core::person::PersonRecord;

/// Rule for combining multiple sources' attributes for the same person.
///
/// Identifiers are matched by exact equality; records with equal
/// identifiers across sources are the same person. A query matching
/// several distinct people merges each independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// First source (in configuration order) with any record for a
    /// given identifier wins; later records for that identifier are
    /// ignored. For priority/fallback chains.
    None,
    /// Later sources overwrite attribute-by-attribute; attributes only
    /// an earlier source set are preserved.
    #[default]
    Replace,
    /// Value lists from every source are concatenated in source order,
    /// duplicates and order preserved.
    Multivalue,
}

impl MergePolicy {
    /// Get the string representation used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::None => "none",
            MergePolicy::Replace => "replace",
            MergePolicy::Multivalue => "multivalue",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MergePolicy {
    type Err = ParseMergePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(MergePolicy::None),
            "replace" => Ok(MergePolicy::Replace),
            "multivalue" => Ok(MergePolicy::Multivalue),
            _ => Err(ParseMergePolicyError(s.to_string())),
        }
    }
}

/// Error parsing merge policy from string.
#[derive(Debug, Clone)]
pub struct ParseMergePolicyError(String);

impl fmt::Display for ParseMergePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid merge policy '{}', expected one of: none, replace, multivalue",
            self.0
        )
    }
}

impl std::error::Error for ParseMergePolicyError {}

/// Merge per-source record sets into one record set keyed by
/// identifier.
///
/// `per_source` must be in source configuration order.
pub fn merge(policy: MergePolicy, per_source: Vec<Vec<PersonRecord>>) -> Vec<PersonRecord> {
    let mut merged: Vec<PersonRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for records in per_source {
        for record in records {
            match index.get(record.id()) {
                None => {
                    index.insert(record.id().to_string(), merged.len());
                    merged.push(record);
                }
                Some(&at) => merge_into(policy, &mut merged[at], record),
            }
        }
    }

    merged
}

fn merge_into(policy: MergePolicy, existing: &mut PersonRecord, incoming: PersonRecord) {
    match policy {
        // Earlier source already resolved this identifier.
        MergePolicy::None => {}
        MergePolicy::Replace => {
            for (name, values) in incoming.iter() {
                existing.set(name.clone(), values.clone());
            }
        }
        MergePolicy::Multivalue => {
            for (name, values) in incoming.iter() {
                existing.append(name.clone(), values.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, attrs: &[(&str, &[&str])]) -> PersonRecord {
        let mut record = PersonRecord::new(id);
        for (name, values) in attrs {
            record.set(
                name.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            );
        }
        record
    }

    #[test]
    fn test_none_first_source_wins() {
        let merged = merge(
            MergePolicy::None,
            vec![
                vec![person("p", &[("x", &["1"])])],
                vec![person("p", &[("x", &["2"])])],
            ],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get("x").unwrap(), &["1"]);
    }

    #[test]
    fn test_replace_overwrites_and_preserves() {
        let merged = merge(
            MergePolicy::Replace,
            vec![
                vec![person("p", &[("x", &["1"]), ("y", &["9"])])],
                vec![person("p", &[("x", &["2"])])],
            ],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get("x").unwrap(), &["2"]);
        assert_eq!(merged[0].get("y").unwrap(), &["9"]);
    }

    #[test]
    fn test_multivalue_concatenates_in_source_order() {
        let merged = merge(
            MergePolicy::Multivalue,
            vec![
                vec![person("p", &[("x", &["1"])])],
                vec![person("p", &[("x", &["2"])])],
            ],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get("x").unwrap(), &["1", "2"]);
    }

    #[test]
    fn test_multivalue_preserves_duplicates() {
        let merged = merge(
            MergePolicy::Multivalue,
            vec![
                vec![person("p", &[("x", &["1"])])],
                vec![person("p", &[("x", &["1"])])],
            ],
        );

        assert_eq!(merged[0].get("x").unwrap(), &["1", "1"]);
    }

    #[test]
    fn test_later_only_identifiers_are_added() {
        let merged = merge(
            MergePolicy::Replace,
            vec![
                vec![person("a", &[("x", &["1"])])],
                vec![person("b", &[("x", &["2"])])],
            ],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id(), "a");
        assert_eq!(merged[1].id(), "b");
    }

    #[test]
    fn test_distinct_people_merge_independently() {
        let merged = merge(
            MergePolicy::Multivalue,
            vec![
                vec![
                    person("a", &[("x", &["1"])]),
                    person("b", &[("x", &["5"])]),
                ],
                vec![person("a", &[("x", &["2"])])],
            ],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].get("x").unwrap(), &["1", "2"]);
        assert_eq!(merged[1].get("x").unwrap(), &["5"]);
    }

    #[test]
    fn test_merge_policy_parsing() {
        assert_eq!("none".parse::<MergePolicy>().unwrap(), MergePolicy::None);
        assert_eq!(
            "REPLACE".parse::<MergePolicy>().unwrap(),
            MergePolicy::Replace
        );
        assert_eq!(
            "multivalue".parse::<MergePolicy>().unwrap(),
            MergePolicy::Multivalue
        );
        assert!("append".parse::<MergePolicy>().is_err());
    }

    #[test]
    fn test_union_of_attribute_names() {
        let merged = merge(
            MergePolicy::Multivalue,
            vec![
                vec![person("p", &[("x", &["1"])])],
                vec![person("p", &[("y", &["2"])])],
            ],
        );

        assert_eq!(merged[0].get("x").unwrap(), &["1"]);
        assert_eq!(merged[0].get("y").unwrap(), &["2"]);
    }
}
