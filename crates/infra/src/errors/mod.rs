//! Infrastructure error handling.
//!
//! External crate errors (sqlite, keychain, HTTP) are folded into
//! [`faxgate_domain::FaxError`] through the [`InfraError`] newtype so that
//! repository and client code can use `?` without leaking vendor types.

mod conversions;

pub use conversions::InfraError;
