//! Core types for the access layer.
//!
//! - [`Condition`], [`ExpandedCondition`], [`Operator`] - Search conditions
//! - [`Properties`] - Property mappings of records and storage rows
//! - [`ContentOpener`], [`ContentStream`] - Lazily opened record content
//!
//! # Examples
//!
//! ```
//! use helios_access::types::{Condition, Operator, parse_request};
//!
//! let conditions = parse_request("artist=Nina Simone/year>=1958/3").unwrap();
//! assert_eq!(conditions[0], Condition::new("artist", Operator::Eq, "Nina Simone"));
//! assert_eq!(conditions[2], Condition::value(3));
//! ```

mod condition;
mod content;

use std::collections::BTreeMap;

pub use condition::{
    Condition, CustomOperator, ExpandedCondition, Operator, Predicate, parse_request,
};
pub use content::{BoxedReader, ContentOpener, ContentStream};

/// Property values, as JSON.
pub use serde_json::Value;

/// A property mapping, keyed by property name.
pub type Properties = BTreeMap<String, Value>;
