//! SqlCipher-backed implementation of the PollCheckpointStore port.
//!
//! Gateway state lives in the `fax_settings` key/value table. The poll
//! checkpoint is stored as an RFC 3339 string so it stays readable when
//! inspecting the database by hand.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faxgate_core::fax::PollCheckpointStore;
use faxgate_domain::{FaxError, Result};
use rusqlite::{OptionalExtension, ToSql};
use tracing::{debug, instrument};

use super::sqlcipher_pool::SqlCipherPool;
use crate::errors::InfraError;

const LAST_POLL_TIME_KEY: &str = "last_poll_time";

/// SqlCipher implementation of PollCheckpointStore.
pub struct SqlCipherSettingsRepository {
    pool: Arc<SqlCipherPool>,
}

impl SqlCipherSettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: Arc<SqlCipherPool>) -> Self {
        Self { pool }
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT value FROM fax_settings WHERE key = ?1",
            [&key as &dyn ToSql].as_ref(),
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| InfraError::from(err).into())
    }

    fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.pool.get()?;
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO fax_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            [&key as &dyn ToSql, &value, &now].as_ref(),
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

#[async_trait]
impl PollCheckpointStore for SqlCipherSettingsRepository {
    #[instrument(skip(self))]
    async fn last_poll_time(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.get_setting(LAST_POLL_TIME_KEY)? else {
            return Ok(None);
        };

        let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|err| {
            FaxError::Serialization(format!("invalid poll checkpoint '{raw}': {err}"))
        })?;

        Ok(Some(parsed.with_timezone(&Utc)))
    }

    #[instrument(skip(self))]
    async fn set_last_poll_time(&self, at: DateTime<Utc>) -> Result<()> {
        self.put_setting(LAST_POLL_TIME_KEY, &at.to_rfc3339())?;
        debug!(checkpoint = %at, "advanced poll checkpoint");
        Ok(())
    }
}
