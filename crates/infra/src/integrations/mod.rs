//! External provider integrations.

pub mod sinch;
