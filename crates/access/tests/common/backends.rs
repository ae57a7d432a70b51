//! Instrumented backends.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use helios_access::core::{Backend, Record, StorageRow, StorageRows, matches_all};
use helios_access::error::{AccessResult, BackendError};
use helios_access::types::{BoxedReader, ContentOpener, ExpandedCondition, Properties};

/// Counts backend activity.
#[derive(Debug, Default)]
pub struct Counters {
    searches: AtomicUsize,
    rows: AtomicUsize,
    opens: AtomicUsize,
    last_conditions: parking_lot::Mutex<Vec<ExpandedCondition>>,
}

impl Counters {
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> usize {
        self.rows.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Conditions received by the most recent storage search.
    pub fn last_conditions(&self) -> Vec<ExpandedCondition> {
        self.last_conditions.lock().clone()
    }
}

/// A read-only backend over fixed rows that records what it is asked to do.
#[derive(Debug)]
pub struct CountingBackend {
    properties: Vec<String>,
    rows: Vec<(Properties, Arc<[u8]>)>,
    counters: Arc<Counters>,
}

impl CountingBackend {
    pub fn new(properties: &[&str], rows: Vec<(Properties, Vec<u8>)>) -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let backend = Self {
            properties: properties.iter().map(|p| p.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|(properties, content)| (properties, Arc::from(content)))
                .collect(),
            counters: counters.clone(),
        };
        (backend, counters)
    }
}

impl Backend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn storage_properties(&self) -> AccessResult<Vec<String>> {
        Ok(self.properties.clone())
    }

    fn storage_search(&self, conditions: &[ExpandedCondition]) -> AccessResult<StorageRows<'_>> {
        self.counters.searches.fetch_add(1, Ordering::SeqCst);
        *self.counters.last_conditions.lock() = conditions.to_vec();
        let conditions = conditions.to_vec();

        Ok(Box::new(self.rows.iter().filter_map(move |(properties, content)| {
            self.counters.rows.fetch_add(1, Ordering::SeqCst);
            match matches_all(&conditions, properties) {
                Ok(true) => {
                    let counters = self.counters.clone();
                    let content = content.clone();
                    let opener = ContentOpener::new(move || {
                        counters.opens.fetch_add(1, Ordering::SeqCst);
                        Ok(Box::new(std::io::Cursor::new(content.clone())) as BoxedReader)
                    });
                    Some(Ok(StorageRow::new(properties.clone(), opener)))
                }
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            }
        })))
    }

    fn save(&self, _record: &Record<'_>) -> AccessResult<()> {
        Err(BackendError::not_implemented(self.name(), "save").into())
    }

    fn remove(&self, _record: &Record<'_>) -> AccessResult<()> {
        Err(BackendError::not_implemented(self.name(), "remove").into())
    }
}
