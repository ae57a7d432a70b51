//! Record parsers.
//!
//! A parser turns record content into properties. Which parser an access
//! point uses is named by the `parser` configuration key and resolved through
//! a [`ParserRegistry`].
//!
//! Built-in parsers:
//!
//! | Id | Properties |
//! |----|------------|
//! | `raw` | none; content is opaque bytes |
//! | `text` | `text`: the whole content, decoded with the default encoding |
//! | `json` | the members of a top-level JSON object |

use std::fmt::Debug;
use std::io::Read;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{RecordError, RegistryError};
use crate::types::Properties;

/// Extracts properties from record content.
pub trait RecordParser: Send + Sync + Debug {
    /// The identifier used in configuration.
    fn id(&self) -> &str;

    /// Parses content into properties, keyed by parser-native names.
    fn parse(&self, content: &mut dyn Read, encoding: &str) -> Result<Properties, RecordError>;

    /// Returns false if this parser never produces properties, so content
    /// does not need to be opened to look a property up.
    fn provides_properties(&self) -> bool {
        true
    }
}

/// Content is opaque; no properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawParser;

impl RecordParser for RawParser {
    fn id(&self) -> &str {
        "raw"
    }

    fn parse(&self, _content: &mut dyn Read, _encoding: &str) -> Result<Properties, RecordError> {
        Ok(Properties::new())
    }

    fn provides_properties(&self) -> bool {
        false
    }
}

/// Decoded text content under the `text` property.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser;

impl TextParser {
    /// Name of the property holding the decoded content.
    pub const PROPERTY: &'static str = "text";
}

impl RecordParser for TextParser {
    fn id(&self) -> &str {
        "text"
    }

    fn parse(&self, content: &mut dyn Read, encoding: &str) -> Result<Properties, RecordError> {
        let text = read_text(self.id(), content, encoding)?;
        Ok(Properties::from([(
            Self::PROPERTY.to_string(),
            Value::String(text),
        )]))
    }
}

/// Members of a top-level JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl RecordParser for JsonParser {
    fn id(&self) -> &str {
        "json"
    }

    fn parse(&self, content: &mut dyn Read, encoding: &str) -> Result<Properties, RecordError> {
        let text = read_text(self.id(), content, encoding)?;
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(members)) => Ok(members.into_iter().collect()),
            Ok(other) => Err(RecordError::Parse {
                parser: self.id().to_string(),
                message: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(RecordError::Parse {
                parser: self.id().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn read_text(parser: &str, content: &mut dyn Read, encoding: &str) -> Result<String, RecordError> {
    let mut bytes = Vec::new();
    content.read_to_end(&mut bytes)?;
    decode(parser, bytes, encoding)
}

/// Decodes bytes with one of the supported encodings.
///
/// Supported: `utf-8`, `iso-8859-1` (`latin-1`) and `ascii`. Names are
/// matched case-insensitively, ignoring `-` and `_`.
pub fn decode(parser: &str, bytes: Vec<u8>, encoding: &str) -> Result<String, RecordError> {
    let normalized: String = encoding
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match normalized.as_str() {
        "utf8" => String::from_utf8(bytes).map_err(|e| RecordError::Parse {
            parser: parser.to_string(),
            message: e.to_string(),
        }),
        "iso88591" | "latin1" => Ok(bytes.into_iter().map(char::from).collect()),
        "ascii" | "usascii" => {
            if let Some(position) = bytes.iter().position(|b| !b.is_ascii()) {
                return Err(RecordError::Parse {
                    parser: parser.to_string(),
                    message: format!("non-ASCII byte at offset {}", position),
                });
            }
            Ok(bytes.into_iter().map(char::from).collect())
        }
        _ => Err(RecordError::UnsupportedEncoding {
            encoding: encoding.to_string(),
        }),
    }
}

/// Parsers by identifier.
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn RecordParser>>,
}

impl ParserRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in parsers.
    pub fn with_defaults() -> Self {
        Self {
            parsers: vec![Arc::new(RawParser), Arc::new(TextParser), Arc::new(JsonParser)],
        }
    }

    /// Registers a parser. Identifiers are unique.
    pub fn register(&mut self, parser: Arc<dyn RecordParser>) -> Result<&mut Self, RegistryError> {
        if self.contains(parser.id()) {
            return Err(RegistryError::DuplicateParser {
                parser: parser.id().to_string(),
            });
        }
        self.parsers.push(parser);
        Ok(self)
    }

    /// Returns true if a parser is registered under this identifier.
    pub fn contains(&self, id: &str) -> bool {
        self.parsers.iter().any(|parser| parser.id() == id)
    }

    /// Looks up a parser.
    pub fn get(&self, id: &str) -> Result<Arc<dyn RecordParser>, RegistryError> {
        self.parsers
            .iter()
            .find(|parser| parser.id() == id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownParser {
                parser: id.to_string(),
            })
    }

    /// Registered identifiers, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.parsers.iter().map(|parser| parser.id())
    }
}
