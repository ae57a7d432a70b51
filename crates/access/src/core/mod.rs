//! Core traits and types.
//!
//! - [`Backend`] and [`BackendProvider`]: the storage driver contract
//! - [`RecordParser`] and [`ParserRegistry`]: content parsing
//! - [`Record`]: one stored item with lazily parsed properties

pub mod backend;
pub mod parser;
pub mod record;

pub use backend::{Backend, BackendProvider, StorageRow, StorageRows, matches_all, value_to_string};
pub use parser::{JsonParser, ParserRegistry, RawParser, RecordParser, TextParser};
pub use record::Record;
