//! Integration tests for resolving access points through registries.

mod common;

use std::sync::Arc;

use common::*;
use helios_access::config::ConfigWarning;
use helios_access::core::{Backend, BackendProvider, ParserRegistry, RecordParser, TextParser};
use helios_access::error::{AccessError, AccessResult, RecordError, RegistryError};
use helios_access::types::{Condition, Properties};
use helios_access::{AccessPoint, AccessPointConfig, BackendRegistry};
use serde_json::json;

/// A backend registered by an application under its own protocol.
#[derive(Debug)]
struct Albums(CountingBackend);

impl Backend for Albums {
    fn name(&self) -> &'static str {
        "albums"
    }

    fn storage_properties(&self) -> AccessResult<Vec<String>> {
        self.0.storage_properties()
    }

    fn storage_search(
        &self,
        conditions: &[helios_access::ExpandedCondition],
    ) -> AccessResult<helios_access::core::StorageRows<'_>> {
        self.0.storage_search(conditions)
    }

    fn save(&self, record: &helios_access::Record<'_>) -> AccessResult<()> {
        self.0.save(record)
    }

    fn remove(&self, record: &helios_access::Record<'_>) -> AccessResult<()> {
        self.0.remove(record)
    }
}

impl BackendProvider for Albums {
    const PROTOCOL: &'static str = "albums";

    fn from_config(_config: &AccessPointConfig) -> AccessResult<Self> {
        let rows = ALBUMS
            .iter()
            .map(|(id, title, artist, year)| {
                (album_properties(*id, title, artist), album_content(*year))
            })
            .collect();
        Ok(Albums(CountingBackend::new(&["key", "name", "band"], rows).0))
    }
}

/// Upper-cases text content; shows custom parsers plug in like built-ins.
#[derive(Debug)]
struct ShoutParser;

impl RecordParser for ShoutParser {
    fn id(&self) -> &str {
        "shout"
    }

    fn parse(
        &self,
        content: &mut dyn std::io::Read,
        encoding: &str,
    ) -> Result<Properties, RecordError> {
        let parsed = TextParser.parse(content, encoding)?;
        Ok(parsed
            .into_iter()
            .map(|(name, value)| (name, json!(value.as_str().unwrap_or_default().to_uppercase())))
            .collect())
    }
}

#[test]
fn test_unknown_protocol() {
    let err = AccessPoint::from_url(album_config("ftp://example.org/albums")).unwrap_err();
    assert!(matches!(
        err,
        AccessError::Registry(RegistryError::UnknownProtocol { ref protocol }) if protocol == "ftp"
    ));
}

#[test]
fn test_unknown_parser() {
    let config = album_config("memory:")
        .with_parser("xml")
        .with_extra("properties", "key");
    assert!(matches!(
        AccessPoint::from_url(config),
        Err(AccessError::Registry(RegistryError::UnknownParser { .. }))
    ));
}

#[test]
fn test_custom_backend_and_parser() {
    let mut backends = BackendRegistry::with_defaults();
    backends.register::<Albums>().unwrap();
    let mut parsers = ParserRegistry::with_defaults();
    parsers.register(Arc::new(ShoutParser)).unwrap();

    let config = album_config("albums:")
        .with_parser("shout")
        .with_parser_aliases("lyrics=text");
    let ap = AccessPoint::open(config, &backends, &parsers).unwrap();
    assert_eq!(ap.backend().name(), "albums");

    let record = ap.search_first(vec![Condition::value(4)]).unwrap().unwrap();
    assert_eq!(record.property("title").unwrap(), &json!("Ballads"));
    let lyrics = record.property("lyrics").unwrap().as_str().unwrap();
    assert!(lyrics.contains("\"RELEASED\""));
}

#[test]
fn test_protocol_without_colon() {
    let ap = AccessPoint::from_url(album_config("memory").with_extra("properties", "key")).unwrap();
    assert_eq!(ap.backend().name(), "memory");
}

#[test]
fn test_malformed_aliases_are_warned_and_skipped() {
    let config = album_config("memory:")
        .with_storage_aliases("id=key/broken/title=name/id=other")
        .with_extra("properties", "key/name");
    let warnings = config.validate().unwrap();
    assert_eq!(warnings.len(), 2);
    assert!(matches!(warnings[0], ConfigWarning::MalformedAlias { .. }));
    assert!(matches!(warnings[1], ConfigWarning::DuplicateAlias { .. }));

    let ap = AccessPoint::from_url(config).unwrap();
    assert_eq!(ap.property_names(), vec!["id", "title", "id", "year"]);
}
