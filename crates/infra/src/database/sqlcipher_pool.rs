//! SQLCipher connection pool.
//!
//! r2d2-based pooling over encrypted SQLite. Every pooled connection gets the
//! key pragma and the cipher parameters applied before first use, followed by
//! the journal and concurrency pragmas.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use faxgate_domain::constants::DEFAULT_DB_POOL_SIZE;
use faxgate_domain::{FaxError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;

/// A connection checked out of the pool.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Pool tuning knobs.
#[derive(Debug, Clone)]
pub struct SqlCipherPoolConfig {
    pub max_size: u32,
    pub connection_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Default for SqlCipherPoolConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_DB_POOL_SIZE,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Connection pool for a SQLCipher-encrypted database file.
pub struct SqlCipherPool {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl fmt::Debug for SqlCipherPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlCipherPool").field("path", &self.path).finish()
    }
}

impl SqlCipherPool {
    /// Open (or create) the database at `path` and build the pool.
    ///
    /// A test connection is checked out immediately so that a wrong key fails
    /// here rather than on the first query.
    #[instrument(skip(encryption_key), fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, encryption_key: &str, config: SqlCipherPoolConfig) -> Result<Self> {
        info!("creating SQLCipher connection pool");

        let key = encryption_key.to_owned();
        let busy_timeout = config.busy_timeout;
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            configure_cipher(conn, &key)?;
            apply_connection_pragmas(conn, busy_timeout)?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.max_size.max(1))
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|err| {
                warn!(error = %err, "failed to create connection pool");
                classify_open_error(&err.to_string())
            })?;

        {
            let conn = pool.get().map_err(|err| classify_open_error(&err.to_string()))?;
            verify_encryption(&conn)?;
            debug!("encryption verified");
        }

        Ok(Self { pool, path: path.to_path_buf() })
    }

    /// Check a connection out of the pool.
    pub fn get(&self) -> Result<DbConnection> {
        self.pool.get().map_err(|err| {
            warn!(error = %err, "failed to acquire pooled connection");
            FaxError::from(InfraError::from(err))
        })
    }

    /// The database file backing this pool.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn configure_cipher(conn: &Connection, key: &str) -> rusqlite::Result<()> {
    // Key must be applied before any other statement touches the file.
    conn.pragma_update(None, "key", key)?;
    conn.pragma_update(None, "cipher_compatibility", 4)?;
    conn.pragma_update(None, "kdf_iter", 256_000)?;
    conn.pragma_update(None, "cipher_memory_security", "ON")?;
    Ok(())
}

fn apply_connection_pragmas(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;\n\
         PRAGMA wal_autocheckpoint=1000;\n\
         PRAGMA synchronous=NORMAL;\n\
         PRAGMA foreign_keys=ON;",
    )?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

/// Force SQLCipher to decrypt real pages so a bad key surfaces immediately.
fn verify_encryption(conn: &Connection) -> Result<()> {
    conn.query_row("PRAGMA user_version", [], |_| Ok(()))
        .and_then(|()| conn.query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(())))
        .map_err(|err| {
            let message = err.to_string();
            if looks_like_wrong_key(&message) {
                FaxError::Database("SQLCipher key rejected or database not encrypted".into())
            } else {
                FaxError::from(InfraError::from(err))
            }
        })
}

fn classify_open_error(message: &str) -> FaxError {
    if looks_like_wrong_key(message) {
        FaxError::Database("SQLCipher key rejected or database not encrypted".into())
    } else {
        FaxError::Database(format!("failed to open database: {message}"))
    }
}

fn looks_like_wrong_key(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("file is not a database")
        || lower.contains("file is encrypted")
        || lower.contains("database disk image is malformed")
        || lower.contains("notadb")
}
