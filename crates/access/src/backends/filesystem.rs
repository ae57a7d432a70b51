//! Filesystem backend.
//!
//! Each record is a file under a root directory. The `file_pattern` option
//! maps file paths to properties with `{name}` placeholders:
//!
//! ```text
//! url:          file:///srv/music
//! file_pattern: {artist}/{album}/{title}.txt
//! ```
//!
//! `Coltrane/Blue Train/Locomotion.txt` then yields `artist`, `album` and
//! `title`. Two more native properties are always present:
//!
//! | Property | Value |
//! |----------|-------|
//! | `path` | path relative to the root, `/`-separated |
//! | `modified` | last modification time, RFC 3339 |
//!
//! A relative URL path is resolved against the configured `basedir`. The
//! directory tree is walked lazily, one directory at a time, in name order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::config::AccessPointConfig;
use crate::core::{
    Backend, BackendProvider, Record, StorageRow, StorageRows, matches_all, value_to_string,
};
use crate::error::{AccessResult, BackendError};
use crate::types::{BoxedReader, ContentOpener, ExpandedCondition, Properties};

const BACKEND_NAME: &str = "filesystem";

/// Native property holding the relative path.
pub const PATH_PROPERTY: &str = "path";
/// Native property holding the modification time.
pub const MODIFIED_PROPERTY: &str = "modified";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed `file_pattern`.
#[derive(Debug, Clone)]
pub struct FileTemplate {
    pattern: String,
    segments: Vec<Segment>,
    regex: Regex,
}

impl FileTemplate {
    /// Parses a pattern such as `{artist}/{title}.txt`.
    pub fn parse(pattern: &str) -> Result<Self, BackendError> {
        let invalid = |message: String| BackendError::InvalidConfig {
            backend: BACKEND_NAME.to_string(),
            message,
        };

        let mut segments = Vec::new();
        let mut rest = pattern;
        while let Some(start) = rest.find('{') {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 1..];
            let end = after
                .find('}')
                .ok_or_else(|| invalid(format!("unclosed placeholder in '{}'", pattern)))?;
            let name = &after[..end];
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(format!("invalid placeholder '{{{}}}'", name)));
            }
            if name == PATH_PROPERTY || name == MODIFIED_PROPERTY {
                return Err(invalid(format!("placeholder '{}' is reserved", name)));
            }
            if segments.contains(&Segment::Placeholder(name.to_string())) {
                return Err(invalid(format!("placeholder '{}' is repeated", name)));
            }
            segments.push(Segment::Placeholder(name.to_string()));
            rest = &after[end + 1..];
        }
        if rest.contains('}') {
            return Err(invalid(format!("unmatched '}}' in '{}'", pattern)));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        if !segments.iter().any(|s| matches!(s, Segment::Placeholder(_))) {
            return Err(invalid(format!("'{}' has no placeholders", pattern)));
        }

        let mut source = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Placeholder(name) => {
                    source.push_str(&format!("(?P<{}>[^/]+?)", name));
                }
            }
        }
        source.push('$');
        let regex = Regex::new(&source).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            regex,
        })
    }

    /// The pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Placeholder names, in order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Extracts placeholder values from a relative path.
    pub fn capture(&self, relative: &str) -> Option<Properties> {
        let captures = self.regex.captures(relative)?;
        Some(
            self.placeholders()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.to_string(), Value::String(m.as_str().to_string())))
                })
                .collect(),
        )
    }

    /// Builds a relative path from property values.
    pub fn render(&self, properties: &Properties) -> Result<String, BackendError> {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(name) => {
                    let value = properties.get(name).ok_or_else(|| BackendError::MissingProperty {
                        backend: BACKEND_NAME.to_string(),
                        property: name.clone(),
                    })?;
                    let value = value_to_string(value);
                    if value.is_empty() || value.contains('/') || value == "." || value == ".." {
                        return Err(BackendError::Internal {
                            backend: BACKEND_NAME.to_string(),
                            message: format!("'{}' is not a valid value for '{}'", value, name),
                        });
                    }
                    path.push_str(&value);
                }
            }
        }
        Ok(path)
    }
}

/// Backend storing one file per record.
#[derive(Debug)]
pub struct FilesystemBackend {
    root: PathBuf,
    template: FileTemplate,
}

impl FilesystemBackend {
    /// Creates a backend rooted at a directory.
    pub fn new(root: impl Into<PathBuf>, template: FileTemplate) -> Self {
        Self {
            root: root.into(),
            template,
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file template.
    pub fn template(&self) -> &FileTemplate {
        &self.template
    }

    fn row(&self, path: PathBuf) -> io::Result<Option<StorageRow>> {
        let Some(relative) = relative_path(&self.root, &path) else {
            tracing::warn!(path = %path.display(), "skipping file with a non UTF-8 name");
            return Ok(None);
        };
        let Some(mut properties) = self.template.capture(&relative) else {
            return Ok(None);
        };

        let modified: DateTime<Utc> = fs::metadata(&path)?.modified()?.into();
        properties.insert(PATH_PROPERTY.to_string(), Value::String(relative));
        properties.insert(
            MODIFIED_PROPERTY.to_string(),
            Value::String(modified.to_rfc3339()),
        );

        let opener = ContentOpener::new(move || {
            let file = fs::File::open(&path)?;
            Ok(Box::new(file) as BoxedReader)
        });
        Ok(Some(StorageRow::new(properties, opener)))
    }
}

impl Backend for FilesystemBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn storage_properties(&self) -> AccessResult<Vec<String>> {
        let mut properties: Vec<String> =
            self.template.placeholders().map(str::to_string).collect();
        properties.push(PATH_PROPERTY.to_string());
        properties.push(MODIFIED_PROPERTY.to_string());
        Ok(properties)
    }

    fn storage_search(&self, conditions: &[ExpandedCondition]) -> AccessResult<StorageRows<'_>> {
        if !self.root.is_dir() {
            return Err(BackendError::io(
                BACKEND_NAME,
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} is not a directory", self.root.display()),
                ),
            )
            .into());
        }
        let conditions = conditions.to_vec();

        Ok(Box::new(FileWalk::new(&self.root).filter_map(move |entry| {
            let row = match entry.and_then(|path| self.row(path)) {
                Ok(Some(row)) => row,
                Ok(None) => return None,
                Err(e) => return Some(Err(BackendError::io(BACKEND_NAME, e).into())),
            };
            match matches_all(&conditions, &row.properties) {
                Ok(true) => Some(Ok(row)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            }
        })))
    }

    fn save(&self, record: &Record<'_>) -> AccessResult<()> {
        let native = record.native_properties();
        let relative = self.template.render(&native)?;
        let target = self.root.join(&relative);

        let content = record.read_content()?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| BackendError::io(BACKEND_NAME, e))?;
        }
        fs::write(&target, content).map_err(|e| BackendError::io(BACKEND_NAME, e))?;

        // A changed property moved the record: drop the old file.
        if let Some(Value::String(previous)) = record.raw_properties().get(PATH_PROPERTY)
            && *previous != relative
        {
            match fs::remove_file(self.root.join(previous)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(BackendError::io(BACKEND_NAME, e).into()),
            }
            tracing::debug!(from = %previous, to = %relative, "moved record file");
        }

        tracing::trace!(path = %relative, "saved record file");
        Ok(())
    }

    fn remove(&self, record: &Record<'_>) -> AccessResult<()> {
        let relative = match record.raw_properties().get(PATH_PROPERTY) {
            Some(Value::String(path)) => path.clone(),
            _ => self.template.render(&record.native_properties())?,
        };
        fs::remove_file(self.root.join(&relative)).map_err(|e| BackendError::io(BACKEND_NAME, e))?;
        tracing::trace!(path = %relative, "removed record file");
        Ok(())
    }
}

impl BackendProvider for FilesystemBackend {
    const PROTOCOL: &'static str = "file";

    fn from_config(config: &AccessPointConfig) -> AccessResult<Self> {
        let pattern = config
            .extra_str("file_pattern")?
            .ok_or_else(|| BackendError::InvalidConfig {
                backend: BACKEND_NAME.to_string(),
                message: "missing 'file_pattern' option".to_string(),
            })?;
        let template = FileTemplate::parse(pattern)?;
        let root = resolve_root(&config.url, &config.basedir);
        Ok(Self::new(root, template))
    }
}

/// Turns `file://<path>` into a directory, relative paths against `basedir`.
fn resolve_root(url: &str, basedir: &Path) -> PathBuf {
    let location = url
        .strip_prefix("file://")
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url);
    let path = Path::new(location);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        basedir.join(path)
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Depth-first walk yielding files, reading one directory per step.
struct FileWalk {
    stack: Vec<PathBuf>,
    started: bool,
    root: PathBuf,
}

impl FileWalk {
    fn new(root: &Path) -> Self {
        Self {
            stack: Vec::new(),
            started: false,
            root: root.to_path_buf(),
        }
    }

    fn push_dir(&mut self, dir: &Path) -> io::Result<()> {
        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        self.stack.extend(entries.into_iter().rev());
        Ok(())
    }
}

impl Iterator for FileWalk {
    type Item = io::Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            let root = self.root.clone();
            if let Err(e) = self.push_dir(&root) {
                return Some(Err(e));
            }
        }

        while let Some(path) = self.stack.pop() {
            let file_type = match fs::symlink_metadata(&path) {
                Ok(metadata) => metadata.file_type(),
                Err(e) => return Some(Err(e)),
            };
            if file_type.is_dir() {
                if let Err(e) = self.push_dir(&path) {
                    return Some(Err(e));
                }
            } else if file_type.is_file() {
                return Some(Ok(path));
            }
        }
        None
    }
}
