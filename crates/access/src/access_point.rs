//! Access points.
//!
//! An [`AccessPoint`] binds a configuration to a backend and a record parser
//! and is the entry point for searching and persisting records.
//!
//! # Search
//!
//! [`AccessPoint::search`] plans the query eagerly and fetches lazily:
//!
//! 1. conditions are expanded (see [`crate::query::expander`]); expansion
//!    errors are returned before the backend is touched;
//! 2. expanded conditions are partitioned between storage and parser
//!    (see [`crate::query::partitioner`]);
//! 3. the backend search starts on the first call to `next()`;
//! 4. each row becomes a [`Record`] and is kept if every parser condition
//!    holds. Content is opened only for parser conditions that need it.
//!
//! Items are `Result`s. An error on one row is yielded and iteration goes on
//! with the next row.

use std::fmt;
use std::sync::Arc;

use crate::alias::AliasTable;
use crate::config::AccessPointConfig;
use crate::core::{Backend, ParserRegistry, Record, RecordParser, StorageRows};
use crate::error::AccessResult;
use crate::query::{PartitionedConditions, expand_conditions, partition_conditions};
use crate::registry::BackendRegistry;
use crate::types::{Condition, ContentOpener, ExpandedCondition, Properties};

/// A configured view over one storage location.
#[derive(Debug)]
pub struct AccessPoint {
    config: AccessPointConfig,
    aliases: AliasTable,
    backend: Box<dyn Backend>,
    parser: Arc<dyn RecordParser>,
}

impl AccessPoint {
    /// Opens an access point, resolving its backend and parser.
    ///
    /// Configuration warnings are logged; errors abort.
    pub fn open(
        config: AccessPointConfig,
        backends: &BackendRegistry,
        parsers: &ParserRegistry,
    ) -> AccessResult<Self> {
        for warning in config.validate()? {
            tracing::warn!(url = %config.url, "{}", warning);
        }
        let parser = parsers.get(config.require_parser()?)?;
        let backend = backends.resolve(&config)?;
        Self::assemble(config, backend, parser)
    }

    /// Opens an access point with the built-in backends and parsers.
    pub fn from_url(config: AccessPointConfig) -> AccessResult<Self> {
        Self::open(
            config,
            &BackendRegistry::with_defaults(),
            &ParserRegistry::with_defaults(),
        )
    }

    /// Builds an access point around an existing backend and parser.
    pub fn with_backend(
        config: AccessPointConfig,
        backend: Box<dyn Backend>,
        parser: Arc<dyn RecordParser>,
    ) -> AccessResult<Self> {
        for warning in config.validate()? {
            tracing::warn!(url = %config.url, "{}", warning);
        }
        Self::assemble(config, backend, parser)
    }

    fn assemble(
        config: AccessPointConfig,
        backend: Box<dyn Backend>,
        parser: Arc<dyn RecordParser>,
    ) -> AccessResult<Self> {
        let aliases = AliasTable::from_config(&config);
        tracing::debug!(
            url = %config.url,
            backend = backend.name(),
            parser = parser.id(),
            "opened access point"
        );
        Ok(Self {
            config,
            aliases,
            backend,
            parser,
        })
    }

    /// The configuration.
    pub fn config(&self) -> &AccessPointConfig {
        &self.config
    }

    /// The URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Parsed storage and parser aliases.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// The backend.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// The record parser.
    pub fn parser(&self) -> &Arc<dyn RecordParser> {
        &self.parser
    }

    /// Positional property names: storage aliases first, then parser aliases.
    pub fn property_names(&self) -> Vec<&str> {
        self.aliases.property_names()
    }

    /// Native property names of the backend.
    pub fn storage_properties(&self) -> AccessResult<Vec<String>> {
        self.backend.storage_properties()
    }

    /// Fills in omitted property names and operators.
    pub fn expand_conditions<I>(&self, conditions: I) -> AccessResult<Vec<ExpandedCondition>>
    where
        I: IntoIterator<Item = Condition>,
    {
        let names = self.property_names();
        let expanded = expand_conditions(conditions, &names).collect::<Result<Vec<_>, _>>()?;
        Ok(expanded)
    }

    /// Expands conditions and splits them between storage and parser.
    pub fn partition_conditions<I>(&self, conditions: I) -> AccessResult<PartitionedConditions>
    where
        I: IntoIterator<Item = Condition>,
    {
        let expanded = self.expand_conditions(conditions)?;
        let storage_properties = self.storage_properties()?;
        Ok(partition_conditions(
            expanded,
            &self.aliases,
            &storage_properties,
        ))
    }

    /// Searches records matching every condition.
    pub fn search<I>(&self, conditions: I) -> AccessResult<SearchResults<'_>>
    where
        I: IntoIterator<Item = Condition>,
    {
        let plan = self.partition_conditions(conditions)?;
        tracing::debug!(
            url = %self.config.url,
            storage = ?plan.storage,
            parser = ?plan.parser,
            "planned search"
        );
        Ok(SearchResults {
            access_point: self,
            pending: Some(plan.storage),
            rows: None,
            parser_conditions: plan.parser,
        })
    }

    /// Returns the first matching record, if any.
    pub fn search_first<I>(&self, conditions: I) -> AccessResult<Option<Record<'_>>>
    where
        I: IntoIterator<Item = Condition>,
    {
        self.search(conditions)?.next().transpose()
    }

    /// Creates a new, unsaved record.
    ///
    /// `properties` are keyed by public names.
    pub fn create(&self, properties: Properties, content: impl Into<Arc<[u8]>>) -> Record<'_> {
        let mut record = Record::new(
            self,
            self.parser.clone(),
            ContentOpener::from_bytes(content),
            Properties::new(),
        );
        for (name, value) in properties {
            record.set_property(name, value);
        }
        record
    }

    /// Persists a record.
    pub fn save(&self, record: &Record<'_>) -> AccessResult<()> {
        tracing::debug!(url = %self.config.url, "saving record");
        self.backend.save(record)
    }

    /// Deletes a record.
    pub fn remove(&self, record: &Record<'_>) -> AccessResult<()> {
        tracing::debug!(url = %self.config.url, "removing record");
        self.backend.remove(record)
    }
}

/// Lazy search results. See [`AccessPoint::search`].
pub struct SearchResults<'ap> {
    access_point: &'ap AccessPoint,
    pending: Option<Vec<ExpandedCondition>>,
    rows: Option<StorageRows<'ap>>,
    parser_conditions: Vec<ExpandedCondition>,
}

impl<'ap> SearchResults<'ap> {
    /// Conditions applied to records after retrieval.
    pub fn parser_conditions(&self) -> &[ExpandedCondition] {
        &self.parser_conditions
    }

    /// Returns true once the backend search has started.
    pub fn is_started(&self) -> bool {
        self.pending.is_none()
    }
}

impl<'ap> Iterator for SearchResults<'ap> {
    type Item = AccessResult<Record<'ap>>;

    fn next(&mut self) -> Option<Self::Item> {
        let access_point = self.access_point;
        if let Some(storage) = self.pending.take() {
            match access_point.backend.storage_search(&storage) {
                Ok(rows) => self.rows = Some(rows),
                Err(e) => return Some(Err(e)),
            }
        }

        let rows = self.rows.as_mut()?;
        loop {
            let row = match rows.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            let record = Record::new(
                access_point,
                access_point.parser.clone(),
                row.opener,
                row.properties,
            );
            match accept(&self.parser_conditions, &record) {
                Ok(true) => return Some(Ok(record)),
                Ok(false) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl fmt::Debug for SearchResults<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResults")
            .field("url", &self.access_point.config.url)
            .field("started", &self.is_started())
            .field("parser_conditions", &self.parser_conditions)
            .finish()
    }
}

fn accept(conditions: &[ExpandedCondition], record: &Record<'_>) -> AccessResult<bool> {
    for condition in conditions {
        if !condition.matches(record.property(&condition.property)?)? {
            return Ok(false);
        }
    }
    Ok(true)
}
