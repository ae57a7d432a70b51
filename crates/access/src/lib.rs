//! Helios Access Layer
//!
//! This crate provides uniform, property-based access to heterogeneous
//! storage. An access point binds a URL to a storage backend and a record
//! parser; records are searched with simple conditions and persisted back
//! through the same access point.
//!
//! # Features
//!
//! - **Pluggable Backends**: resolved from the URL protocol through a registry
//! - **Aliases**: public property names mapped to storage and parser names
//! - **Positional Conditions**: unnamed conditions take declared names in order
//! - **Query Push-down**: conditions on storage properties run in the backend
//! - **Lazy Records**: content is opened only when a property or the content is needed
//!
//! Available backend features:
//! - `filesystem` (default) - one file per record, properties from a path template
//!
//! # Architecture
//!
//! - [`types`] - Conditions, operators, properties and content streams
//! - [`error`] - Error types for all operations
//! - [`config`] - Access point configuration
//! - [`alias`] - Storage and parser alias tables
//! - [`query`] - Condition expansion and partitioning
//! - [`core`] - Backend and parser traits, records
//! - [`registry`] - Protocol to backend resolution
//! - [`backends`] - Backend implementations
//!
//! # Quick Start
//!
//! ```
//! use helios_access::{AccessPoint, AccessPointConfig};
//! use helios_access::types::{Condition, Operator, Properties};
//! use serde_json::json;
//!
//! let config = AccessPointConfig::new("memory:")
//!     .with_parser("json")
//!     .with_storage_aliases("id=key/title=name")
//!     .with_extra("properties", "key/name");
//! let ap = AccessPoint::from_url(config).unwrap();
//!
//! let record = ap.create(
//!     Properties::from([
//!         ("id".to_string(), json!(1)),
//!         ("title".to_string(), json!("Blue Train")),
//!     ]),
//!     br#"{"year": 1958}"#.to_vec(),
//! );
//! record.save().unwrap();
//!
//! // "1" is matched against the first positional name, "id".
//! let found = ap.search_first(vec![Condition::value(1)]).unwrap().unwrap();
//! assert_eq!(found.property("title").unwrap(), &json!("Blue Train"));
//! assert_eq!(found.property("year").unwrap(), &json!(1958));
//!
//! let later = ap
//!     .search(vec![Condition::new("year", Operator::Gt, 1960)])
//!     .unwrap()
//!     .count();
//! assert_eq!(later, 0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod access_point;
pub mod alias;
pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod query;
pub mod registry;
pub mod types;

// Re-export commonly used types at crate root
pub use access_point::{AccessPoint, SearchResults};
pub use config::{AccessPointConfig, ConfigWarning};
pub use error::{AccessError, AccessResult};
pub use registry::BackendRegistry;
pub use types::{Condition, ExpandedCondition, Operator, Properties};

// Re-export core traits
pub use crate::core::{Backend, BackendProvider, ParserRegistry, Record, RecordParser};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
