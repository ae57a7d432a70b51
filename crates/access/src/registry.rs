//! Backend registry.
//!
//! Maps URL protocols to backend factories. The protocol of a URL is the text
//! before its first `:`; a URL without `:` is its own protocol.
//!
//! | URL | Protocol |
//! |-----|----------|
//! | `file:///srv/music` | `file` |
//! | `memory:` | `memory` |
//! | `memory` | `memory` |
//!
//! Registration is explicit. [`BackendRegistry::with_defaults`] registers the
//! backends compiled into this crate; applications add their own with
//! [`BackendRegistry::register`] or [`BackendRegistry::register_factory`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::AccessPointConfig;
use crate::core::{Backend, BackendProvider};
use crate::error::{AccessResult, RegistryError};

/// Builds a backend from a configuration.
pub type BackendFactory =
    dyn Fn(&AccessPointConfig) -> AccessResult<Box<dyn Backend>> + Send + Sync;

/// Returns the protocol token of a URL.
pub fn protocol_of(url: &str) -> &str {
    match url.split_once(':') {
        Some((protocol, _)) => protocol,
        None => url,
    }
}

/// Registry of backend factories keyed by protocol.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: Vec<(String, Arc<BackendFactory>)>,
    index: HashMap<String, usize>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (protocol, factory) in builtins() {
            registry.push(protocol.to_string(), factory);
        }
        registry
    }

    /// Registers a backend type under its protocol.
    pub fn register<B: BackendProvider>(&mut self) -> Result<&mut Self, RegistryError> {
        self.insert(B::PROTOCOL, Arc::new(build::<B>))?;
        Ok(self)
    }

    /// Registers a factory under a protocol.
    pub fn register_factory<F>(
        &mut self,
        protocol: impl Into<String>,
        factory: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&AccessPointConfig) -> AccessResult<Box<dyn Backend>> + Send + Sync + 'static,
    {
        self.insert(protocol, Arc::new(factory))?;
        Ok(self)
    }

    /// Returns true if a backend is registered for this protocol.
    pub fn contains(&self, protocol: &str) -> bool {
        self.index.contains_key(protocol)
    }

    /// Registered protocols, in registration order.
    pub fn protocols(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(protocol, _)| protocol.as_str())
    }

    /// Instantiates the backend serving the configured URL.
    pub fn resolve(&self, config: &AccessPointConfig) -> AccessResult<Box<dyn Backend>> {
        let protocol = config.protocol();
        let Some(&position) = self.index.get(protocol) else {
            return Err(RegistryError::UnknownProtocol {
                protocol: protocol.to_string(),
            }
            .into());
        };

        let (_, factory) = &self.factories[position];
        let backend = factory(config)?;
        tracing::debug!(protocol, backend = backend.name(), url = %config.url, "resolved backend");
        Ok(backend)
    }

    fn insert(
        &mut self,
        protocol: impl Into<String>,
        factory: Arc<BackendFactory>,
    ) -> Result<(), RegistryError> {
        let protocol = protocol.into();
        if self.index.contains_key(&protocol) {
            return Err(RegistryError::DuplicateProtocol { protocol });
        }
        self.push(protocol, factory);
        Ok(())
    }

    fn push(&mut self, protocol: String, factory: Arc<BackendFactory>) {
        self.index.insert(protocol.clone(), self.factories.len());
        self.factories.push((protocol, factory));
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("protocols", &self.protocols().collect::<Vec<_>>())
            .finish()
    }
}

/// Backends compiled into this crate. Protocols are distinct.
fn builtins() -> Vec<(&'static str, Arc<BackendFactory>)> {
    vec![
        (
            crate::backends::MemoryBackend::PROTOCOL,
            Arc::new(build::<crate::backends::MemoryBackend>) as Arc<BackendFactory>,
        ),
        #[cfg(feature = "filesystem")]
        (
            crate::backends::FilesystemBackend::PROTOCOL,
            Arc::new(build::<crate::backends::FilesystemBackend>) as Arc<BackendFactory>,
        ),
    ]
}

fn build<B: BackendProvider>(config: &AccessPointConfig) -> AccessResult<Box<dyn Backend>> {
    Ok(Box::new(B::from_config(config)?))
}
