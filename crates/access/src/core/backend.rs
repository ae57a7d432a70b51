//! Backend abstraction for storage drivers.
//!
//! This module defines the [`Backend`] trait every storage implementation
//! provides, and [`BackendProvider`], which ties an implementation to the URL
//! protocol it serves so it can be registered in a
//! [`BackendRegistry`](crate::registry::BackendRegistry).
//!
//! A backend only has to understand its own native properties. Conditions on
//! anything else never reach it: they are applied by the access point after
//! records are built.

use std::fmt::Debug;

use serde_json::Value;

use crate::config::AccessPointConfig;
use crate::error::AccessResult;
use crate::types::{ContentOpener, ExpandedCondition, Properties};

use super::record::Record;

/// One row produced by a backend's native search.
#[derive(Debug, Clone)]
pub struct StorageRow {
    /// Raw properties, keyed by storage-native names.
    pub properties: Properties,
    /// Opens the row content on demand.
    pub opener: ContentOpener,
}

impl StorageRow {
    /// Creates a storage row.
    pub fn new(properties: Properties, opener: ContentOpener) -> Self {
        Self { properties, opener }
    }
}

/// Lazy sequence of storage rows.
pub type StorageRows<'a> = Box<dyn Iterator<Item = AccessResult<StorageRow>> + 'a>;

/// A storage backend.
///
/// All operations are required. A backend that cannot support one of them
/// (a read-only store, for example) returns
/// [`BackendError::NotImplemented`](crate::error::BackendError::NotImplemented)
/// instead of silently doing nothing.
///
/// # Example
///
/// ```
/// use helios_access::core::{Backend, Record, StorageRow, StorageRows};
/// use helios_access::error::{AccessResult, BackendError};
/// use helios_access::types::ExpandedCondition;
///
/// #[derive(Debug)]
/// struct Empty;
///
/// impl Backend for Empty {
///     fn name(&self) -> &'static str {
///         "empty"
///     }
///
///     fn storage_properties(&self) -> AccessResult<Vec<String>> {
///         Ok(vec!["id".to_string()])
///     }
///
///     fn storage_search(
///         &self,
///         _conditions: &[ExpandedCondition],
///     ) -> AccessResult<StorageRows<'_>> {
///         Ok(Box::new(std::iter::empty::<AccessResult<StorageRow>>()))
///     }
///
///     fn save(&self, _record: &Record<'_>) -> AccessResult<()> {
///         Err(BackendError::not_implemented(self.name(), "save").into())
///     }
///
///     fn remove(&self, _record: &Record<'_>) -> AccessResult<()> {
///         Err(BackendError::not_implemented(self.name(), "remove").into())
///     }
/// }
/// ```
pub trait Backend: Send + Sync + Debug {
    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Returns the native (unaliased) names of the properties this backend stores.
    fn storage_properties(&self) -> AccessResult<Vec<String>>;

    /// Searches rows matching every condition.
    ///
    /// Condition properties are storage-native names. The returned iterator
    /// must do its I/O on demand and must not open row content.
    fn storage_search(&self, conditions: &[ExpandedCondition]) -> AccessResult<StorageRows<'_>>;

    /// Creates or updates a record.
    fn save(&self, record: &Record<'_>) -> AccessResult<()>;

    /// Deletes a record.
    fn remove(&self, record: &Record<'_>) -> AccessResult<()>;
}

/// A backend that can be instantiated from a configuration.
pub trait BackendProvider: Backend + Sized + 'static {
    /// The URL protocol this backend serves (`file` for `file:///srv/data`).
    const PROTOCOL: &'static str;

    /// Instantiates the backend.
    fn from_config(config: &AccessPointConfig) -> AccessResult<Self>;
}

/// Evaluates storage conditions against native properties.
///
/// A row without one of the condition properties does not match. Operator
/// errors are returned unchanged.
pub fn matches_all(
    conditions: &[ExpandedCondition],
    properties: &Properties,
) -> AccessResult<bool> {
    for condition in conditions {
        let Some(actual) = properties.get(&condition.property) else {
            return Ok(false);
        };
        if !condition.matches(actual)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Renders a property value as a plain string (strings without quotes).
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccessError, OperatorError};
    use crate::types::Operator;
    use serde_json::json;

    fn properties() -> Properties {
        Properties::from([
            ("id".to_string(), json!(7)),
            ("title".to_string(), json!("Giant Steps")),
        ])
    }

    #[test]
    fn test_matches_all() {
        let conditions = vec![
            ExpandedCondition::new("id", Operator::Ge, 5),
            ExpandedCondition::new("title", Operator::Matches, "Steps$"),
        ];
        assert!(matches_all(&conditions, &properties()).unwrap());

        let conditions = vec![ExpandedCondition::new("id", Operator::Lt, 5)];
        assert!(!matches_all(&conditions, &properties()).unwrap());
    }

    #[test]
    fn test_matches_all_missing_property() {
        let conditions = vec![ExpandedCondition::new("year", Operator::Eq, 1960)];
        assert!(!matches_all(&conditions, &properties()).unwrap());
    }

    #[test]
    fn test_matches_all_propagates_operator_errors() {
        let conditions = vec![ExpandedCondition::new("title", Operator::Gt, 3)];
        let err = matches_all(&conditions, &properties()).unwrap_err();
        assert!(matches!(
            err,
            AccessError::Operator(OperatorError::Incomparable { .. })
        ));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("a b")), "a b");
        assert_eq!(value_to_string(&json!(12)), "12");
        assert_eq!(value_to_string(&json!(true)), "true");
    }
}
