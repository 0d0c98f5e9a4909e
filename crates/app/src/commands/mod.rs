//! CLI command implementations.

pub mod download;
pub mod get;
pub mod list;
pub mod poll;
pub mod send;
pub mod serve;
