//! Filesystem persistence for fax documents.

mod file_store;

pub use file_store::LocalFaxFileStore;
