//! Storage backend implementations.
//!
//! | Protocol | Backend | Feature |
//! |----------|---------|---------|
//! | `memory` | [`MemoryBackend`] | always |
//! | `file` | [`FilesystemBackend`] | `filesystem` |

pub mod memory;

#[cfg(feature = "filesystem")]
pub mod filesystem;

pub use memory::MemoryBackend;

#[cfg(feature = "filesystem")]
pub use filesystem::{FileTemplate, FilesystemBackend};
