//! Condition partitioning.
//!
//! Splits expanded conditions between the backend and the record parser:
//!
//! | Condition property | Goes to | Name sent |
//! |--------------------|---------|-----------|
//! | a native storage property | storage | unchanged |
//! | the public alias of a native storage property | storage | native name |
//! | anything else | parser | unchanged |
//!
//! The backend only sees conditions it can evaluate on its own properties;
//! the rest are applied to records after retrieval.

use std::collections::HashSet;

use crate::alias::{AliasNamespace, AliasTable};
use crate::types::ExpandedCondition;

/// Conditions split by where they are evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedConditions {
    /// Conditions pushed down to the backend, with storage-native names.
    pub storage: Vec<ExpandedCondition>,
    /// Conditions applied to records after retrieval, with public names.
    pub parser: Vec<ExpandedCondition>,
}

impl PartitionedConditions {
    /// Total number of conditions.
    pub fn len(&self) -> usize {
        self.storage.len() + self.parser.len()
    }

    /// Returns true if there are no conditions at all.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty() && self.parser.is_empty()
    }

    /// Returns true if every condition is evaluated by the backend.
    pub fn is_fully_pushed_down(&self) -> bool {
        self.parser.is_empty()
    }
}

/// Splits conditions into storage-evaluable and parser-evaluable subsets.
///
/// `storage_properties` are the backend's native property names. A
/// condition is storage-evaluable when its property is one of them or the
/// public alias of one of them. Relative order is kept within each subset.
pub fn partition_conditions<I, S>(
    conditions: I,
    aliases: &AliasTable,
    storage_properties: &[S],
) -> PartitionedConditions
where
    I: IntoIterator<Item = ExpandedCondition>,
    S: AsRef<str>,
{
    let mut comparable: HashSet<&str> = HashSet::new();
    for native in storage_properties {
        let native = native.as_ref();
        comparable.insert(native);
        comparable.insert(aliases.to_public(AliasNamespace::Storage, native));
    }

    let mut partitioned = PartitionedConditions::default();
    for condition in conditions {
        if comparable.contains(condition.property.as_str()) {
            let native = aliases
                .to_native(AliasNamespace::Storage, &condition.property)
                .to_string();
            partitioned.storage.push(condition.renamed(native));
        } else {
            partitioned.parser.push(condition);
        }
    }

    partitioned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operator;

    fn conditions() -> Vec<ExpandedCondition> {
        vec![
            ExpandedCondition::new("a", Operator::Eq, 1),
            ExpandedCondition::new("lyrics", Operator::Matches, "love"),
            ExpandedCondition::new("p2", Operator::Gt, 2),
            ExpandedCondition::new("path", Operator::Ne, "x"),
            ExpandedCondition::new("d", Operator::Ge, 4),
        ]
    }

    #[test]
    fn test_aliased_properties_are_translated() {
        let aliases = AliasTable::parse("a=p1/b=p2", "lyrics=USLT");
        let split = partition_conditions(conditions(), &aliases, &["p1", "p2", "path"]);

        assert_eq!(
            split.storage,
            vec![
                ExpandedCondition::new("p1", Operator::Eq, 1),
                ExpandedCondition::new("p2", Operator::Gt, 2),
                ExpandedCondition::new("path", Operator::Ne, "x"),
            ]
        );
        assert_eq!(
            split.parser,
            vec![
                ExpandedCondition::new("lyrics", Operator::Matches, "love"),
                ExpandedCondition::new("d", Operator::Ge, 4),
            ]
        );
    }

    #[test]
    fn test_partition_is_total() {
        let aliases = AliasTable::parse("a=p1", "");
        let input = conditions();
        let split = partition_conditions(input.clone(), &aliases, &["p1"]);
        assert_eq!(split.len(), input.len());
        assert!(!split.is_fully_pushed_down());
    }

    #[test]
    fn test_no_native_properties_sends_everything_to_parser() {
        let aliases = AliasTable::parse("a=p1", "");
        let split = partition_conditions(conditions(), &aliases, &[] as &[&str]);
        assert!(split.storage.is_empty());
        assert_eq!(split.parser, conditions());
    }

    #[test]
    fn test_alias_for_undeclared_native_stays_in_parser() {
        // "a" aliases "p1", but the backend does not store "p1".
        let aliases = AliasTable::parse("a=p1", "");
        let split = partition_conditions(
            vec![ExpandedCondition::new("a", Operator::Eq, 1)],
            &aliases,
            &["p9".to_string()],
        );
        assert!(split.storage.is_empty());
        assert_eq!(split.parser.len(), 1);
    }

    #[test]
    fn test_shared_native_name_is_reached_through_last_alias() {
        let aliases = AliasTable::parse("a=p1/b=p1", "");
        let split = partition_conditions(
            vec![
                ExpandedCondition::new("a", Operator::Eq, 1),
                ExpandedCondition::new("b", Operator::Eq, 2),
            ],
            &aliases,
            &["p1"],
        );
        assert_eq!(split.storage, vec![ExpandedCondition::new("p1", Operator::Eq, 2)]);
        assert_eq!(split.parser, vec![ExpandedCondition::new("a", Operator::Eq, 1)]);
    }

    #[test]
    fn test_empty_input() {
        let split = partition_conditions(Vec::new(), &AliasTable::default(), &["p1"]);
        assert!(split.is_empty());
        assert!(split.is_fully_pushed_down());
    }
}
