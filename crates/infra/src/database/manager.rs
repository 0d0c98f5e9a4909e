//! Database connection manager backed by the SQLCipher pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use faxgate_domain::{FaxError, Result};
use rusqlite::params;
use tracing::info;

use super::sqlcipher_pool::{SqlCipherPool, SqlCipherPoolConfig};
use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that owns the [`SqlCipherPool`] and the schema.
pub struct DbManager {
    pool: Arc<SqlCipherPool>,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size and SQLCipher key.
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        pool_size: u32,
        encryption_key: Option<&str>,
    ) -> Result<Self> {
        let key = encryption_key
            .ok_or_else(|| FaxError::Config("database encryption key not provided".into()))?;

        let path = db_path.as_ref().to_path_buf();
        let config =
            SqlCipherPoolConfig { max_size: pool_size.max(1), ..SqlCipherPoolConfig::default() };

        let pool = Arc::new(SqlCipherPool::new(&path, key, config)?);

        info!(db_path = %path.display(), pool_size = pool_size.max(1), "sqlcipher pool initialised");

        Ok(Self { pool, path })
    }

    /// Borrow the underlying pool for repository construction.
    pub fn pool(&self) -> &Arc<SqlCipherPool> {
        &self.pool
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire a connection and run a trivial query to verify the database is
    /// accessible and responding.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0)).map_err(map_sql_error)?;
        Ok(())
    }
}

fn map_sql_error(err: rusqlite::Error) -> FaxError {
    FaxError::from(InfraError::from(err))
}
