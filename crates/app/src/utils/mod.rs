//! Shared helpers for the faxgate binary.

pub mod health;
