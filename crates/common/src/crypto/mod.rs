//! Shared cryptographic primitives for configuration secrets.

pub mod encryption;

pub use encryption::{EncryptedData, EncryptionService};
