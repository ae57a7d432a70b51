//! Records.
//!
//! A [`Record`] is one stored item: raw properties from the backend, lazily
//! opened content, and the properties the parser extracts from that content.
//!
//! Property lookup order:
//!
//! | Step | Source | Name used |
//! |------|--------|-----------|
//! | 1 | values set with [`Record::set_property`] | public name |
//! | 2 | raw storage properties | storage-native name, then the name itself |
//! | 3 | parsed content (parsed once, on first need) | parser-native name, then the name itself |

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::access_point::AccessPoint;
use crate::alias::AliasNamespace;
use crate::error::{AccessResult, RecordError};
use crate::types::{ContentOpener, ContentStream, Properties};

use super::parser::RecordParser;

/// One item of an access point.
pub struct Record<'ap> {
    access_point: &'ap AccessPoint,
    parser: Arc<dyn RecordParser>,
    opener: ContentOpener,
    raw: Properties,
    parsed: OnceCell<Properties>,
    overrides: Properties,
}

impl<'ap> Record<'ap> {
    /// Creates a record.
    ///
    /// Nothing is read here: content is opened only when a parsed property
    /// or the content itself is requested.
    pub fn new(
        access_point: &'ap AccessPoint,
        parser: Arc<dyn RecordParser>,
        opener: ContentOpener,
        raw: Properties,
    ) -> Self {
        Self {
            access_point,
            parser,
            opener,
            raw,
            parsed: OnceCell::new(),
            overrides: Properties::new(),
        }
    }

    /// The access point this record belongs to.
    pub fn access_point(&self) -> &'ap AccessPoint {
        self.access_point
    }

    /// Identifier of the parser used for this record.
    pub fn parser_id(&self) -> &str {
        self.parser.id()
    }

    /// Raw properties as the backend returned them.
    pub fn raw_properties(&self) -> &Properties {
        &self.raw
    }

    /// Returns true if a property was set since retrieval.
    pub fn is_modified(&self) -> bool {
        !self.overrides.is_empty()
    }

    /// Looks a property up by its public name.
    pub fn property(&self, name: &str) -> AccessResult<&Value> {
        if let Some(value) = self.overrides.get(name) {
            return Ok(value);
        }

        let aliases = self.access_point.aliases();
        let native = aliases.to_native(AliasNamespace::Storage, name);
        if let Some(value) = self.raw.get(native).or_else(|| self.raw.get(name)) {
            return Ok(value);
        }

        if self.parser.provides_properties() {
            let parsed = self.parsed()?;
            let native = aliases.to_native(AliasNamespace::Parser, name);
            if let Some(value) = parsed.get(native).or_else(|| parsed.get(name)) {
                return Ok(value);
            }
        }

        Err(RecordError::MissingProperty {
            name: name.to_string(),
        }
        .into())
    }

    /// All properties under their public names.
    ///
    /// This parses the content if the parser provides properties.
    pub fn properties(&self) -> AccessResult<Properties> {
        let aliases = self.access_point.aliases();
        let mut properties = Properties::new();

        for (native, value) in &self.raw {
            properties.insert(
                aliases.to_public(AliasNamespace::Storage, native).to_string(),
                value.clone(),
            );
        }
        if self.parser.provides_properties() {
            for (native, value) in self.parsed()? {
                properties
                    .entry(aliases.to_public(AliasNamespace::Parser, native).to_string())
                    .or_insert_with(|| value.clone());
            }
        }
        for (name, value) in &self.overrides {
            properties.insert(name.clone(), value.clone());
        }

        Ok(properties)
    }

    /// Raw properties with changes applied, keyed by storage-native names.
    ///
    /// This is the view a backend persists.
    pub fn native_properties(&self) -> Properties {
        let aliases = self.access_point.aliases();
        let mut properties = self.raw.clone();
        for (name, value) in &self.overrides {
            properties.insert(
                aliases.to_native(AliasNamespace::Storage, name).to_string(),
                value.clone(),
            );
        }
        properties
    }

    /// Sets a property by its public name.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.overrides.insert(name.into(), value.into());
    }

    /// Replaces the content. Parsed properties are recomputed on next use.
    pub fn set_content(&mut self, content: impl Into<Arc<[u8]>>) {
        self.opener = ContentOpener::from_bytes(content);
        self.parsed = OnceCell::new();
    }

    /// Opens the content stream. The stream is released when dropped.
    pub fn open_content(&self) -> AccessResult<ContentStream> {
        Ok(self.opener.open()?)
    }

    /// Reads the whole content.
    pub fn read_content(&self) -> AccessResult<Vec<u8>> {
        Ok(self.opener.read_all()?)
    }

    /// Persists this record through its access point.
    pub fn save(&self) -> AccessResult<()> {
        self.access_point.save(self)
    }

    /// Deletes this record through its access point.
    pub fn remove(&self) -> AccessResult<()> {
        self.access_point.remove(self)
    }

    fn parsed(&self) -> AccessResult<&Properties> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }

        let encoding = &self.access_point.config().default_encoding;
        let mut stream = self.opener.open()?;
        let parsed = self.parser.parse(&mut stream, encoding)?;
        stream.close();
        tracing::trace!(
            parser = self.parser.id(),
            properties = parsed.len(),
            "parsed record content"
        );

        Ok(self.parsed.get_or_init(|| parsed))
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("url", &self.access_point.config().url)
            .field("parser", &self.parser.id())
            .field("raw", &self.raw)
            .field("overrides", &self.overrides)
            .field("parsed", &self.parsed.get().is_some())
            .finish()
    }
}
