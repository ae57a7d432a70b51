//! Error types for the access layer.
//!
//! This module defines all error types used throughout the access layer,
//! following a hierarchy that separates registry errors, configuration errors,
//! condition errors, operator errors, record errors and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all access point operations.
///
/// This enum encompasses all possible errors that can occur while resolving
/// a backend, expanding conditions, searching or persisting records.
#[derive(Error, Debug)]
pub enum AccessError {
    /// Backend and parser registry errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Condition expansion and request parsing errors
    #[error(transparent)]
    Condition(#[from] ConditionError),

    /// Errors raised while applying an operator
    #[error(transparent)]
    Operator(#[from] OperatorError),

    /// Record property and content errors
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to backend and parser registration and lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No backend is registered for the protocol of the configured URL.
    #[error("unknown protocol: {protocol}")]
    UnknownProtocol { protocol: String },

    /// A backend is already registered for this protocol.
    #[error("protocol already registered: {protocol}")]
    DuplicateProtocol { protocol: String },

    /// No parser is registered under this identifier.
    #[error("unknown parser: {parser}")]
    UnknownParser { parser: String },

    /// A parser is already registered under this identifier.
    #[error("parser already registered: {parser}")]
    DuplicateParser { parser: String },
}

/// Errors related to access point configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration has no URL.
    #[error("missing required configuration key: url")]
    MissingUrl,

    /// The configuration has no parser, which every record needs.
    #[error("missing required configuration key: parser (url: {url})")]
    MissingParser { url: String },

    /// A configuration value has the wrong shape.
    #[error("invalid configuration option '{key}': {message}")]
    InvalidOption { key: String, message: String },
}

/// Errors related to search conditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    /// An unnamed condition has no positional property name to fall back to.
    #[error("condition {position} has no property name; {available} positional names declared")]
    MissingPropertyName { position: usize, available: usize },

    /// A request string could not be parsed into a condition.
    #[error("invalid request '{request}': {message}")]
    InvalidRequest { request: String, message: String },
}

/// Errors raised by operators while comparing values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperatorError {
    /// The operator cannot order or match these two values.
    #[error("operator '{operator}' cannot compare {actual} with {expected}")]
    Incomparable {
        operator: String,
        actual: String,
        expected: String,
    },

    /// A regular expression operand failed to compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A custom operator reported a failure.
    #[error("operator '{operator}' failed: {message}")]
    Custom { operator: String, message: String },
}

/// Errors related to record properties and content.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The record has no property with this name.
    #[error("record has no property '{name}'")]
    MissingProperty { name: String },

    /// The record content could not be parsed.
    #[error("parser '{parser}' failed: {message}")]
    Parse { parser: String, message: String },

    /// The configured text encoding is not supported.
    #[error("unsupported encoding: {encoding}")]
    UnsupportedEncoding { encoding: String },

    /// Opening or reading the record content failed.
    #[error("content error: {0}")]
    Content(#[from] std::io::Error),
}

/// Errors originating from a storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend does not support this operation.
    #[error("operation '{operation}' not implemented by backend {backend}")]
    NotImplemented {
        backend: String,
        operation: String,
    },

    /// An I/O operation failed inside the backend.
    #[error("I/O error in {backend}: {source}")]
    Io {
        backend: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend-specific configuration is invalid.
    #[error("invalid configuration for {backend}: {message}")]
    InvalidConfig { backend: String, message: String },

    /// A record lacks a native property the backend needs to persist it.
    #[error("{backend} needs property '{property}' to store a record")]
    MissingProperty { backend: String, property: String },

    /// Internal backend error.
    #[error("internal error in {backend}: {message}")]
    Internal { backend: String, message: String },
}

impl BackendError {
    /// Creates a not-implemented error for an operation.
    pub fn not_implemented(backend: impl Into<String>, operation: impl Into<String>) -> Self {
        BackendError::NotImplemented {
            backend: backend.into(),
            operation: operation.into(),
        }
    }

    /// Wraps an I/O error raised by a backend.
    pub fn io(backend: impl Into<String>, source: std::io::Error) -> Self {
        BackendError::Io {
            backend: backend.into(),
            source,
        }
    }
}

/// Result type alias for access point operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Result type alias for operator evaluation.
pub type OperatorResult<T> = Result<T, OperatorError>;

// Implement conversions from common error types

impl From<std::io::Error> for AccessError {
    fn from(err: std::io::Error) -> Self {
        AccessError::Record(RecordError::Content(err))
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::InvalidOption {
            key: "<document>".to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = AccessError::Registry(RegistryError::UnknownProtocol {
            protocol: "ftp".to_string(),
        });
        assert_eq!(err.to_string(), "unknown protocol: ftp");
    }

    #[test]
    fn test_condition_error_display() {
        let err = ConditionError::MissingPropertyName {
            position: 3,
            available: 2,
        };
        assert!(err.to_string().contains("condition 3"));
        assert!(err.to_string().contains("only 2"));
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::not_implemented("memory", "remove");
        assert_eq!(
            err.to_string(),
            "operation 'remove' not implemented by backend memory"
        );
    }

    #[test]
    fn test_access_error_from_parts() {
        let err: AccessError = OperatorError::InvalidPattern {
            pattern: "(".to_string(),
            message: "unclosed group".to_string(),
        }
        .into();
        assert!(matches!(err, AccessError::Operator(_)));

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AccessError = io.into();
        assert!(matches!(err, AccessError::Record(RecordError::Content(_))));
    }
}
