//! In-memory backend.
//!
//! Rows live in a `Vec` behind a read-write lock. The `properties` option
//! lists the native properties, separated by `/`; the first one is the key
//! used to match records on save and remove.
//!
//! ```text
//! url:        memory:
//! properties: id/title/artist
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::config::AccessPointConfig;
use crate::core::{Backend, BackendProvider, Record, StorageRow, StorageRows, matches_all};
use crate::error::{AccessResult, BackendError};
use crate::types::{ContentOpener, ExpandedCondition, Operator, Properties};

const BACKEND_NAME: &str = "memory";

#[derive(Debug, Clone)]
struct MemoryRow {
    properties: Properties,
    content: Arc<[u8]>,
}

/// Backend keeping records in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    properties: Vec<String>,
    rows: RwLock<Vec<MemoryRow>>,
}

impl MemoryBackend {
    /// Creates an empty backend storing the given native properties.
    ///
    /// The first property is the record key.
    pub fn new(properties: Vec<String>) -> Result<Self, BackendError> {
        if properties.is_empty() {
            return Err(BackendError::InvalidConfig {
                backend: BACKEND_NAME.to_string(),
                message: "at least one property is required".to_string(),
            });
        }
        Ok(Self {
            properties,
            rows: RwLock::new(Vec::new()),
        })
    }

    /// Adds a row directly, bypassing key matching.
    pub fn insert(&self, properties: Properties, content: impl Into<Arc<[u8]>>) {
        self.rows.write().push(MemoryRow {
            properties,
            content: content.into(),
        });
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn key(&self) -> &str {
        &self.properties[0]
    }

    /// Key comparison uses condition equality, so `1` and `1.0` are one key.
    fn has_key(&self, row: &MemoryRow, key: &Value) -> bool {
        row.properties
            .get(self.key())
            .is_some_and(|value| Operator::Eq.evaluate(value, key).unwrap_or(false))
    }

    fn key_of(&self, record: &Record<'_>) -> Result<Value, BackendError> {
        record
            .native_properties()
            .remove(self.key())
            .ok_or_else(|| BackendError::MissingProperty {
                backend: BACKEND_NAME.to_string(),
                property: self.key().to_string(),
            })
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn storage_properties(&self) -> AccessResult<Vec<String>> {
        Ok(self.properties.clone())
    }

    fn storage_search(&self, conditions: &[ExpandedCondition]) -> AccessResult<StorageRows<'_>> {
        // Iterate over a snapshot so concurrent writers never block readers.
        let snapshot = self.rows.read().clone();
        let conditions = conditions.to_vec();

        Ok(Box::new(snapshot.into_iter().filter_map(move |row| {
            match matches_all(&conditions, &row.properties) {
                Ok(true) => Some(Ok(StorageRow::new(
                    row.properties,
                    ContentOpener::from_bytes(row.content),
                ))),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            }
        })))
    }

    fn save(&self, record: &Record<'_>) -> AccessResult<()> {
        let key = self.key_of(record)?;
        let native = record.native_properties();
        let properties: Properties = self
            .properties
            .iter()
            .filter_map(|name| native.get(name).map(|value| (name.clone(), value.clone())))
            .collect();
        let row = MemoryRow {
            properties,
            content: record.read_content()?.into(),
        };

        let mut rows = self.rows.write();
        match rows.iter_mut().find(|existing| self.has_key(existing, &key)) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        tracing::trace!(%key, rows = rows.len(), "saved memory row");
        Ok(())
    }

    fn remove(&self, record: &Record<'_>) -> AccessResult<()> {
        let key = self.key_of(record)?;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| !self.has_key(row, &key));
        tracing::trace!(%key, removed = before - rows.len(), "removed memory rows");
        Ok(())
    }
}

impl BackendProvider for MemoryBackend {
    const PROTOCOL: &'static str = "memory";

    fn from_config(config: &AccessPointConfig) -> AccessResult<Self> {
        let properties = config
            .extra_str("properties")?
            .ok_or_else(|| BackendError::InvalidConfig {
                backend: BACKEND_NAME.to_string(),
                message: "missing 'properties' option".to_string(),
            })?;
        let properties = properties
            .split('/')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self::new(properties)?)
    }
}
