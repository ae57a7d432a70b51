//! Test infrastructure for the access layer.
//!
//! Shared fixtures and instrumented backends for the integration tests.

#![allow(dead_code)]

pub mod backends;
pub mod fixtures;

pub use backends::*;
pub use fixtures::*;
