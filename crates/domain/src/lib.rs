//! # Faxgate Domain
//!
//! Business domain types and models for Faxgate.
//!
//! This crate contains:
//! - Fax job and provider resource types
//! - Webhook event types
//! - Configuration structures
//! - Domain error types and Result definitions
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Faxgate crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
