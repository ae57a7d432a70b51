//! Test fixtures.

use std::sync::Arc;

use helios_access::core::{JsonParser, RecordParser};
use helios_access::types::Properties;
use helios_access::{AccessPoint, AccessPointConfig};
use serde_json::{Value, json};

use super::backends::{CountingBackend, Counters};

/// Albums as (id, title, artist, year). The year only lives in the content.
pub const ALBUMS: &[(i64, &str, &str, i64)] = &[
    (1, "Blue Train", "Coltrane", 1958),
    (2, "Giant Steps", "Coltrane", 1960),
    (3, "Kind of Blue", "Davis", 1959),
    (4, "Ballads", "Coltrane", 1963),
    (5, "Sketches of Spain", "Davis", 1960),
];

/// Native storage properties of an album row.
pub fn album_properties(id: i64, title: &str, artist: &str) -> Properties {
    Properties::from([
        ("key".to_string(), json!(id)),
        ("name".to_string(), json!(title)),
        ("band".to_string(), json!(artist)),
    ])
}

/// JSON content of an album.
pub fn album_content(year: i64) -> Vec<u8> {
    json!({ "released": year, "format": "LP" }).to_string().into_bytes()
}

/// Config with public names `id`, `title`, `artist` (storage) and `year` (parser).
pub fn album_config(url: &str) -> AccessPointConfig {
    AccessPointConfig::new(url)
        .with_storage_aliases("id=key/title=name/artist=band")
        .with_parser_aliases("year=released")
        .with_parser("json")
}

/// An access point over the albums with an instrumented read-only backend.
pub fn counting_access_point() -> (AccessPoint, Arc<Counters>) {
    let rows = ALBUMS
        .iter()
        .map(|(id, title, artist, year)| {
            (album_properties(*id, title, artist), album_content(*year))
        })
        .collect();
    let (backend, counters) = CountingBackend::new(&["key", "name", "band"], rows);
    let parser: Arc<dyn RecordParser> = Arc::new(JsonParser);
    let ap = AccessPoint::with_backend(album_config("counting:"), Box::new(backend), parser)
        .expect("access point");
    (ap, counters)
}

/// A memory access point populated with the albums.
pub fn memory_access_point() -> AccessPoint {
    let config = album_config("memory:").with_extra("properties", "key/name/band");
    let ap = AccessPoint::from_url(config).expect("access point");
    for (id, title, artist, year) in ALBUMS {
        let record = ap.create(public_properties(*id, title, artist), album_content(*year));
        record.save().expect("save");
    }
    ap
}

/// Public properties of an album.
pub fn public_properties(id: i64, title: &str, artist: &str) -> Properties {
    Properties::from([
        ("id".to_string(), json!(id)),
        ("title".to_string(), json!(title)),
        ("artist".to_string(), json!(artist)),
    ])
}

/// Collects one property of every record, failing on errors.
pub fn collect_property<'ap, I>(records: I, name: &str) -> Vec<Value>
where
    I: Iterator<Item = helios_access::AccessResult<helios_access::Record<'ap>>>,
{
    records
        .map(|record| record.expect("record").property(name).expect("property").clone())
        .collect()
}
