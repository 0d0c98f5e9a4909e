//! # Faxgate Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite/SQLCipher)
//! - HTTP client implementations
//! - The Sinch Fax API client
//! - Webhook receiver, poll scheduler, and document storage
//!
//! ## Architecture
//! - Implements traits defined in `faxgate-core`
//! - Depends on `faxgate-domain` and `faxgate-common`
//! - Contains all "impure" code (I/O, network, database)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod key_manager;
pub mod scheduling;
pub mod storage;
pub mod webhook;

// Re-export commonly used items
pub use config::*;
pub use database::*;
pub use errors::*;
pub use http::*;
pub use integrations::*;
pub use key_manager::*;
pub use scheduling::*;
pub use storage::*;
pub use webhook::*;
