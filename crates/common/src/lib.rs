//! Shared utilities for Faxgate crates.
//!
//! This crate carries the small set of cross-cutting pieces the gateway
//! needs: AES-256-GCM secret encryption for configuration values at rest,
//! the common error type, and test helpers.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod crypto;
pub mod error;
pub mod testing;

// Re-export commonly used types for convenience
pub use crypto::{EncryptedData, EncryptionService};
pub use error::{CommonError, CommonResult};
