//! # Faxgate Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The fax reconciliation service
//!
//! ## Architecture Principles
//! - Only depends on `faxgate-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod fax;

pub use fax::ports::{FaxFileStore, FaxJobRepository, FaxProviderClient, PollCheckpointStore};
pub use fax::FaxService;
