//! Integration tests for the filesystem backend.

#![cfg(feature = "filesystem")]

mod common;

use std::fs;
use std::path::Path;

use common::*;
use helios_access::error::{AccessError, BackendError, ConfigError};
use helios_access::types::{Condition, Operator, Properties};
use helios_access::{AccessPoint, AccessPointConfig};
use serde_json::json;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn music_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Coltrane/Blue Train.txt", "Moment's notice\nLocomotion");
    write(dir.path(), "Coltrane/Giant Steps.txt", "Naima\nCountdown");
    write(dir.path(), "Davis/Kind of Blue.txt", "So What\nBlue in Green");
    write(dir.path(), "Davis/cover.jpg", "not a record");
    dir
}

fn text_config(dir: &TempDir) -> AccessPointConfig {
    AccessPointConfig::new(format!("file://{}", dir.path().display()))
        .with_parser("text")
        .with_storage_aliases("who=artist")
        .with_parser_aliases("lyrics=text")
        .with_extra("file_pattern", "{artist}/{title}.txt")
}

/// Files matching the pattern become records; others are skipped.
#[test]
fn test_search_maps_paths_to_properties() {
    let dir = music_dir();
    let ap = AccessPoint::from_url(text_config(&dir)).unwrap();

    let titles = collect_property(ap.search(Vec::new()).unwrap(), "title");
    assert_eq!(
        titles,
        vec![json!("Blue Train"), json!("Giant Steps"), json!("Kind of Blue")]
    );

    let record = ap.search_first(vec![Condition::value("Davis")]).unwrap().unwrap();
    assert_eq!(record.property("path").unwrap(), &json!("Davis/Kind of Blue.txt"));
    assert!(record.property("modified").unwrap().is_string());
    assert_eq!(record.property("who").unwrap(), &json!("Davis"));
}

/// Parser conditions read the file content through the text parser.
#[test]
fn test_search_on_content() {
    let dir = music_dir();
    let ap = AccessPoint::from_url(text_config(&dir)).unwrap();

    let titles = collect_property(
        ap.search(vec![Condition::new("lyrics", Operator::Matches, "Blue in")])
            .unwrap(),
        "title",
    );
    assert_eq!(titles, vec![json!("Kind of Blue")]);
}

/// Relative URLs are resolved against the base directory.
#[test]
fn test_relative_url_uses_basedir() {
    let dir = music_dir();
    let config = AccessPointConfig::new("file:.")
        .with_basedir(dir.path())
        .with_parser("raw")
        .with_extra("file_pattern", "{artist}/{title}.txt");
    let ap = AccessPoint::from_url(config).unwrap();
    assert_eq!(ap.search(Vec::new()).unwrap().count(), 3);
}

/// Saving renders the pattern, creating directories as needed.
#[test]
fn test_create_and_save() {
    let dir = music_dir();
    let ap = AccessPoint::from_url(text_config(&dir)).unwrap();

    let record = ap.create(
        Properties::from([
            ("who".to_string(), json!("Monk")),
            ("title".to_string(), json!("Brilliant Corners")),
        ]),
        b"Pannonica".to_vec(),
    );
    record.save().unwrap();

    let saved = dir.path().join("Monk/Brilliant Corners.txt");
    assert_eq!(fs::read_to_string(saved).unwrap(), "Pannonica");

    let found = ap
        .search_first(vec![Condition::named("who", "Monk")])
        .unwrap()
        .unwrap();
    assert_eq!(found.property("lyrics").unwrap(), &json!("Pannonica"));
}

/// Changing a path property moves the file.
#[test]
fn test_save_moves_renamed_record() {
    let dir = music_dir();
    let ap = AccessPoint::from_url(text_config(&dir)).unwrap();

    let mut record = ap
        .search_first(vec![Condition::named("title", "Giant Steps")])
        .unwrap()
        .unwrap();
    record.set_property("title", "Giant Steps (Deluxe)");
    record.save().unwrap();

    assert!(!dir.path().join("Coltrane/Giant Steps.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("Coltrane/Giant Steps (Deluxe).txt")).unwrap(),
        "Naima\nCountdown"
    );
}

/// Removing deletes the file.
#[test]
fn test_remove() {
    let dir = music_dir();
    let ap = AccessPoint::from_url(text_config(&dir)).unwrap();

    let record = ap
        .search_first(vec![Condition::named("title", "Blue Train")])
        .unwrap()
        .unwrap();
    record.remove().unwrap();

    assert!(!dir.path().join("Coltrane/Blue Train.txt").exists());
    assert_eq!(ap.search(Vec::new()).unwrap().count(), 2);
}

/// Unsupported encodings fail on the first parsed property, not at open.
#[test]
fn test_unsupported_encoding() {
    let dir = music_dir();
    let ap = AccessPoint::from_url(text_config(&dir).with_default_encoding("ebcdic")).unwrap();

    let record = ap.search_first(Vec::new()).unwrap().unwrap();
    assert_eq!(record.property("title").unwrap(), &json!("Blue Train"));
    assert!(record.property("lyrics").unwrap_err().to_string().contains("ebcdic"));
}

/// The pattern is mandatory.
#[test]
fn test_missing_file_pattern() {
    let dir = music_dir();
    let config =
        AccessPointConfig::new(format!("file://{}", dir.path().display())).with_parser("raw");
    assert!(matches!(
        AccessPoint::from_url(config),
        Err(AccessError::Backend(BackendError::InvalidConfig { .. }))
    ));
}

/// A non-string pattern is a configuration error.
#[test]
fn test_file_pattern_must_be_a_string() {
    let config = AccessPointConfig::new("file:///tmp")
        .with_parser("raw")
        .with_extra("file_pattern", 3);
    assert!(matches!(
        AccessPoint::from_url(config),
        Err(AccessError::Config(ConfigError::InvalidOption { .. }))
    ));
}

/// A missing root surfaces on the first iteration.
#[test]
fn test_missing_root() {
    let dir = TempDir::new().unwrap();
    let config = AccessPointConfig::new(format!("file://{}/absent", dir.path().display()))
        .with_parser("raw")
        .with_extra("file_pattern", "{title}.txt");
    let ap = AccessPoint::from_url(config).unwrap();

    let mut results = ap.search(Vec::new()).unwrap();
    assert!(matches!(
        results.next(),
        Some(Err(AccessError::Backend(BackendError::Io { .. })))
    ));
    assert!(results.next().is_none());
}
