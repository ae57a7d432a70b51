//! Property aliases.
//!
//! Callers address properties by public names. Backends and parsers store
//! them under their own native names. An [`AliasTable`] holds both mappings,
//! one ordered list per [`AliasNamespace`], and is built once from the
//! `storage_aliases` / `parser_aliases` configuration strings:
//!
//! ```text
//! title=TIT2/artist=TPE1/year=TDRC
//! ```
//!
//! Entries without a `=` are dropped. Only the first `=` separates the public
//! name from the native one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AccessPointConfig;

/// The two alias namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasNamespace {
    /// Properties stored natively by the backend.
    Storage,
    /// Properties extracted from content by the record parser.
    Parser,
}

impl fmt::Display for AliasNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasNamespace::Storage => write!(f, "storage"),
            AliasNamespace::Parser => write!(f, "parser"),
        }
    }
}

/// A `public=native` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Name used in conditions and record property views.
    pub public_name: String,
    /// Name used by the backend or parser.
    pub native_name: String,
}

impl AliasEntry {
    /// Creates an alias entry.
    pub fn new(public_name: impl Into<String>, native_name: impl Into<String>) -> Self {
        Self {
            public_name: public_name.into(),
            native_name: native_name.into(),
        }
    }
}

/// Splits an alias string into its non-empty `/`-separated entries.
pub(crate) fn split_alias_entries(aliases: &str) -> impl Iterator<Item = &str> {
    aliases.split('/').filter(|entry| !entry.is_empty())
}

/// Parses an alias string, dropping entries without `=`.
pub fn parse_aliases(aliases: &str) -> Vec<AliasEntry> {
    split_alias_entries(aliases)
        .filter_map(|entry| match entry.split_once('=') {
            Some((public, native)) => Some(AliasEntry::new(public, native)),
            None => {
                tracing::warn!(entry, "ignoring alias entry without '='");
                None
            }
        })
        .collect()
}

/// Bidirectional public/native name mapping for both namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    storage: Vec<AliasEntry>,
    parser: Vec<AliasEntry>,
}

impl AliasTable {
    /// Builds the table from the two alias strings.
    pub fn parse(storage_aliases: &str, parser_aliases: &str) -> Self {
        Self {
            storage: parse_aliases(storage_aliases),
            parser: parse_aliases(parser_aliases),
        }
    }

    /// Builds the table from an access point configuration.
    pub fn from_config(config: &AccessPointConfig) -> Self {
        Self::parse(&config.storage_aliases, &config.parser_aliases)
    }

    /// Returns the entries of a namespace in declaration order.
    pub fn entries(&self, namespace: AliasNamespace) -> &[AliasEntry] {
        match namespace {
            AliasNamespace::Storage => &self.storage,
            AliasNamespace::Parser => &self.parser,
        }
    }

    /// Forward lookup: public name to native name.
    ///
    /// When a public name is declared more than once, the last entry wins.
    pub fn native_name(&self, namespace: AliasNamespace, public_name: &str) -> Option<&str> {
        self.entries(namespace)
            .iter()
            .rev()
            .find(|entry| entry.public_name == public_name)
            .map(|entry| entry.native_name.as_str())
    }

    /// Reverse lookup: native name to public name.
    ///
    /// When a native name is aliased more than once, the last entry wins.
    pub fn public_name(&self, namespace: AliasNamespace, native_name: &str) -> Option<&str> {
        self.entries(namespace)
            .iter()
            .rev()
            .find(|entry| entry.native_name == native_name)
            .map(|entry| entry.public_name.as_str())
    }

    /// Forward lookup that falls back to the name itself.
    pub fn to_native<'a>(&'a self, namespace: AliasNamespace, name: &'a str) -> &'a str {
        self.native_name(namespace, name).unwrap_or(name)
    }

    /// Reverse lookup that falls back to the name itself.
    pub fn to_public<'a>(&'a self, namespace: AliasNamespace, name: &'a str) -> &'a str {
        self.public_name(namespace, name).unwrap_or(name)
    }

    /// Public names of both namespaces, storage first, in declaration order.
    ///
    /// This is the positional fallback for conditions without a property name.
    pub fn property_names(&self) -> Vec<&str> {
        self.storage
            .iter()
            .chain(&self.parser)
            .map(|entry| entry.public_name.as_str())
            .collect()
    }

    /// Returns true if neither namespace has entries.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty() && self.parser.is_empty()
    }
}
