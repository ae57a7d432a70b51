//! Query planning.
//!
//! A search runs in two planning steps before any backend is asked for rows:
//!
//! 1. [`expander`] fills in omitted property names and operators;
//! 2. [`partitioner`] splits the expanded conditions into the ones the
//!    backend evaluates natively and the ones applied to parsed records.
//!
//! # Example
//!
//! ```
//! use helios_access::alias::AliasTable;
//! use helios_access::query::{expand_conditions, partition_conditions};
//! use helios_access::types::{Condition, Operator};
//!
//! let aliases = AliasTable::parse("title=TIT2/artist=TPE1", "lyrics=USLT");
//! let names = aliases.property_names();
//!
//! let expanded = expand_conditions(
//!     vec![Condition::value("Blue Train"), Condition::named("lyrics", "moon")],
//!     &names,
//! )
//! .collect::<Result<Vec<_>, _>>()
//! .unwrap();
//!
//! let split = partition_conditions(expanded, &aliases, &["TIT2", "TPE1"]);
//! assert_eq!(split.storage[0].property, "TIT2");
//! assert_eq!(split.parser[0].property, "lyrics");
//! assert_eq!(split.parser[0].operator, Operator::Eq);
//! ```

pub mod expander;
pub mod partitioner;

pub use expander::{Expand, expand_conditions};
pub use partitioner::{PartitionedConditions, partition_conditions};
