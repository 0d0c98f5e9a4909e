//! Test utilities and helpers
//!
//! Shared across crates so integration tests do not have to re-invent
//! filesystem scaffolding.

pub mod temp;

pub use temp::TempDir;
