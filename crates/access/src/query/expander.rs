//! Condition expansion.
//!
//! Requests may omit the operator and the property name of a condition:
//!
//! - a missing operator means equality;
//! - a missing property name at position *n* means the *n*-th positional
//!   property name of the access point (storage aliases first, then parser
//!   aliases).
//!
//! Expansion is lazy, length preserving and leaves fully specified
//! conditions untouched.

use crate::error::ConditionError;
use crate::types::{Condition, ExpandedCondition};

/// Iterator returned by [`expand_conditions`].
#[derive(Debug)]
pub struct Expand<'n, I> {
    conditions: std::iter::Enumerate<I>,
    property_names: &'n [&'n str],
}

impl<I> Iterator for Expand<'_, I>
where
    I: Iterator<Item = Condition>,
{
    type Item = Result<ExpandedCondition, ConditionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (position, condition) = self.conditions.next()?;
        Some(expand_one(position, condition, self.property_names))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.conditions.size_hint()
    }
}

/// Expands conditions against positional property names.
pub fn expand_conditions<'n, I>(
    conditions: I,
    property_names: &'n [&'n str],
) -> Expand<'n, I::IntoIter>
where
    I: IntoIterator<Item = Condition>,
{
    Expand {
        conditions: conditions.into_iter().enumerate(),
        property_names,
    }
}

fn expand_one(
    position: usize,
    condition: Condition,
    property_names: &[&str],
) -> Result<ExpandedCondition, ConditionError> {
    let property = match condition.property {
        Some(property) => property,
        None => property_names
            .get(position)
            .map(|name| name.to_string())
            .ok_or(ConditionError::MissingPropertyName {
                position,
                available: property_names.len(),
            })?,
    };

    Ok(ExpandedCondition {
        property,
        operator: condition.operator.unwrap_or_default(),
        value: condition.value,
    })
}
