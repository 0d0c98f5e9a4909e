//! Configuration loading and management
//!
//! This module resolves the module configuration from environment variables
//! and config files, including decryption of secrets stored at rest.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_file, probe_config_paths};
