//! SQLCipher-backed persistence: pool, schema management and repositories.

pub mod fax_job_repository;
pub mod manager;
pub mod settings_repository;
pub mod sqlcipher_pool;

pub use fax_job_repository::SqlCipherFaxJobRepository;
pub use manager::DbManager;
pub use settings_repository::SqlCipherSettingsRepository;
pub use sqlcipher_pool::{DbConnection, SqlCipherPool, SqlCipherPoolConfig};
