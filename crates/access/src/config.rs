//! Access point configuration.
//!
//! An [`AccessPointConfig`] is supplied once when an access point is opened
//! and never changes afterwards. It can be built programmatically or read
//! from JSON; keys that are not known to the core are kept in
//! [`AccessPointConfig::extra`] for the backend.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `url` | (required) | Backend URL; the scheme selects the backend |
//! | `default_encoding` | `utf-8` | Text encoding used by parsers |
//! | `storage_aliases` | empty | `public=native/...` aliases for storage properties |
//! | `parser_aliases` | empty | `public=native/...` aliases for parser properties |
//! | `basedir` | empty | Base directory for file-based backends |
//! | `parser` | (required to open) | Record parser identifier |
//!
//! # Example
//!
//! ```
//! use helios_access::AccessPointConfig;
//!
//! let config = AccessPointConfig::new("memory:")
//!     .with_storage_aliases("title=t/artist=a")
//!     .with_parser("json")
//!     .with_extra("properties", "t/a");
//!
//! assert_eq!(config.protocol(), "memory");
//! assert_eq!(config.default_encoding, "utf-8");
//! assert!(config.validate().unwrap().is_empty());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alias::{AliasNamespace, split_alias_entries};
use crate::error::ConfigError;
use crate::registry::protocol_of;

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// Configuration of a single access point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPointConfig {
    /// Backend URL. The part before the first `:` is the protocol.
    pub url: String,

    /// Default text encoding.
    #[serde(default = "default_encoding")]
    pub default_encoding: String,

    /// Storage aliases, `public=native/public=native/...`.
    #[serde(default)]
    pub storage_aliases: String,

    /// Parser aliases, `public=native/public=native/...`.
    #[serde(default)]
    pub parser_aliases: String,

    /// Base directory for file-based backends.
    #[serde(default)]
    pub basedir: PathBuf,

    /// Record parser identifier.
    #[serde(default)]
    pub parser: Option<String>,

    /// Backend-specific keys, passed through unchanged.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl AccessPointConfig {
    /// Creates a configuration with the given URL and defaults for everything else.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            default_encoding: default_encoding(),
            storage_aliases: String::new(),
            parser_aliases: String::new(),
            basedir: PathBuf::new(),
            parser: None,
            extra: HashMap::new(),
        }
    }

    /// Reads a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the default encoding.
    pub fn with_default_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.default_encoding = encoding.into();
        self
    }

    /// Sets the storage aliases.
    pub fn with_storage_aliases(mut self, aliases: impl Into<String>) -> Self {
        self.storage_aliases = aliases.into();
        self
    }

    /// Sets the parser aliases.
    pub fn with_parser_aliases(mut self, aliases: impl Into<String>) -> Self {
        self.parser_aliases = aliases.into();
        self
    }

    /// Sets the base directory.
    pub fn with_basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.basedir = basedir.into();
        self
    }

    /// Sets the parser identifier.
    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    /// Adds a backend-specific key.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns the protocol token of the URL.
    pub fn protocol(&self) -> &str {
        protocol_of(&self.url)
    }

    /// Returns the alias string of a namespace.
    pub fn aliases(&self, namespace: AliasNamespace) -> &str {
        match namespace {
            AliasNamespace::Storage => &self.storage_aliases,
            AliasNamespace::Parser => &self.parser_aliases,
        }
    }

    /// Returns a backend-specific key.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Returns a backend-specific key that must be a string.
    ///
    /// Absent keys yield `Ok(None)`; keys of another type are an error.
    pub fn extra_str(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.extra.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(ConfigError::InvalidOption {
                key: key.to_string(),
                message: format!("expected a string, found {}", other),
            }),
        }
    }

    /// Returns the parser identifier or an error naming this access point.
    pub fn require_parser(&self) -> Result<&str, ConfigError> {
        self.parser.as_deref().ok_or_else(|| ConfigError::MissingParser {
            url: self.url.clone(),
        })
    }

    /// Validates the configuration.
    ///
    /// Returns an error for problems that prevent opening the access point and
    /// a list of warnings for entries the alias parser drops or shadows.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let mut warnings = Vec::new();
        for namespace in [AliasNamespace::Storage, AliasNamespace::Parser] {
            let mut seen = HashSet::new();
            for entry in split_alias_entries(self.aliases(namespace)) {
                match entry.split_once('=') {
                    None => warnings.push(ConfigWarning::MalformedAlias {
                        namespace,
                        entry: entry.to_string(),
                    }),
                    Some((public, _)) => {
                        if !seen.insert(public) {
                            warnings.push(ConfigWarning::DuplicateAlias {
                                namespace,
                                public_name: public.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(warnings)
    }
}

/// Configuration warnings (non-fatal issues).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// An alias entry without `=`; it is ignored.
    MalformedAlias {
        /// Namespace of the entry.
        namespace: AliasNamespace,
        /// The raw entry.
        entry: String,
    },

    /// A public name declared twice in one namespace; the last entry wins.
    DuplicateAlias {
        /// Namespace of the entries.
        namespace: AliasNamespace,
        /// The repeated public name.
        public_name: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::MalformedAlias { namespace, entry } => {
                write!(
                    f,
                    "{} alias entry '{}' has no '=' and is ignored",
                    namespace, entry
                )
            }
            ConfigWarning::DuplicateAlias {
                namespace,
                public_name,
            } => {
                write!(
                    f,
                    "{} alias '{}' is declared more than once",
                    namespace, public_name
                )
            }
        }
    }
}
