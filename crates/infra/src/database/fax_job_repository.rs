//! SqlCipher-backed implementation of the FaxJobRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faxgate_core::fax::FaxJobRepository;
use faxgate_domain::constants::DEFAULT_LIST_LIMIT;
use faxgate_domain::{FaxDirection, FaxJob, FaxJobFilter, ProviderFax, Result};
use rusqlite::{OptionalExtension, ToSql};
use tracing::{debug, instrument};

use super::sqlcipher_pool::SqlCipherPool;
use crate::errors::InfraError;

const JOB_COLUMNS: &str = "id, provider_fax_id, direction, from_number, to_number, status, \
     num_pages, file_path, mime_type, patient_id, user_id, callback_url, cover_page_id, \
     error_code, error_message, provider_create_time, provider_completed_time, created_at, \
     updated_at";

/// SqlCipher implementation of FaxJobRepository.
pub struct SqlCipherFaxJobRepository {
    pool: Arc<SqlCipherPool>,
}

impl SqlCipherFaxJobRepository {
    /// Create a new fax job repository.
    pub fn new(pool: Arc<SqlCipherPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FaxJobRepository for SqlCipherFaxJobRepository {
    #[instrument(skip(self, job))]
    async fn insert_if_absent(&self, job: &FaxJob) -> Result<bool> {
        let conn = self.pool.get()?;

        let direction = job.direction.as_str();
        let provider_create = job.provider_create_time.map(|t| t.timestamp());
        let provider_completed = job.provider_completed_time.map(|t| t.timestamp());
        let created_at = job.created_at.timestamp();
        let updated_at = job.updated_at.timestamp();

        // A NULL provider ID never conflicts, so local-only rows always land.
        let inserted = conn
            .execute(
                "INSERT INTO fax_jobs (
                    id, provider_fax_id, direction, from_number, to_number, status,
                    num_pages, file_path, mime_type, patient_id, user_id, callback_url,
                    cover_page_id, error_code, error_message, provider_create_time,
                    provider_completed_time, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
                ON CONFLICT(provider_fax_id) DO NOTHING",
                [
                    &job.id as &dyn ToSql,
                    &job.provider_fax_id,
                    &direction,
                    &job.from_number,
                    &job.to_number,
                    &job.status,
                    &job.num_pages,
                    &job.file_path,
                    &job.mime_type,
                    &job.patient_id,
                    &job.user_id,
                    &job.callback_url,
                    &job.cover_page_id,
                    &job.error_code,
                    &job.error_message,
                    &provider_create,
                    &provider_completed,
                    &created_at,
                    &updated_at,
                ]
                .as_ref(),
            )
            .map_err(InfraError::from)?;

        debug!(
            job_id = %job.id,
            provider_fax_id = job.provider_fax_id.as_deref().unwrap_or("-"),
            inserted = inserted > 0,
            "insert-if-absent fax job"
        );

        Ok(inserted > 0)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<FaxJob>> {
        let conn = self.pool.get()?;

        let sql = format!("SELECT {JOB_COLUMNS} FROM fax_jobs WHERE id = ?1");
        conn.query_row(&sql, [&id as &dyn ToSql].as_ref(), row_to_job)
            .optional()
            .map_err(|err| InfraError::from(err).into())
    }

    #[instrument(skip(self))]
    async fn find_by_provider_id(&self, provider_fax_id: &str) -> Result<Option<FaxJob>> {
        let conn = self.pool.get()?;

        let sql = format!("SELECT {JOB_COLUMNS} FROM fax_jobs WHERE provider_fax_id = ?1");
        conn.query_row(&sql, [&provider_fax_id as &dyn ToSql].as_ref(), row_to_job)
            .optional()
            .map_err(|err| InfraError::from(err).into())
    }

    #[instrument(skip(self, filter))]
    async fn list(&self, filter: &FaxJobFilter) -> Result<Vec<FaxJob>> {
        let conn = self.pool.get()?;

        let direction = filter.direction.map(|d| d.as_str().to_string());
        let limit = i64::from(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();

        if let Some(direction) = &direction {
            params.push(direction);
            clauses.push(format!("direction = ?{}", params.len()));
        }
        if let Some(status) = &filter.status {
            params.push(status);
            clauses.push(format!("status = ?{}", params.len()));
        }

        let mut sql = format!("SELECT {JOB_COLUMNS} FROM fax_jobs");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        params.push(&limit);
        sql.push_str(&format!(" ORDER BY created_at DESC, id DESC LIMIT ?{}", params.len()));

        let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
        let rows = stmt
            .query_map(params.as_slice(), row_to_job)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        debug!(count = rows.len(), "listed fax jobs");

        Ok(rows)
    }

    #[instrument(skip(self, update))]
    async fn apply_status_update(
        &self,
        provider_fax_id: &str,
        update: &ProviderFax,
    ) -> Result<usize> {
        let conn = self.pool.get()?;

        let completed = update.completed_time.map(|t| t.timestamp());
        let now = Utc::now().timestamp();

        // Error fields only overwrite when the update carries non-empty
        // values, mirroring the in-memory merge policy.
        let affected = conn
            .execute(
                "UPDATE fax_jobs SET
                    status = ?2,
                    num_pages = ?3,
                    provider_completed_time = ?4,
                    error_code = CASE
                        WHEN ?5 IS NOT NULL AND ?5 <> '' THEN ?5 ELSE error_code END,
                    error_message = CASE
                        WHEN ?6 IS NOT NULL AND ?6 <> '' THEN ?6 ELSE error_message END,
                    updated_at = ?7
                 WHERE provider_fax_id = ?1",
                [
                    &provider_fax_id as &dyn ToSql,
                    &update.status,
                    &update.num_pages,
                    &completed,
                    &update.error_code,
                    &update.error_message,
                    &now,
                ]
                .as_ref(),
            )
            .map_err(InfraError::from)?;

        debug!(provider_fax_id, affected, status = %update.status, "applied status update");

        Ok(affected)
    }

    #[instrument(skip(self))]
    async fn set_file_path(&self, id: &str, file_path: &str) -> Result<()> {
        let conn = self.pool.get()?;

        let now = Utc::now().timestamp();
        conn.execute(
            "UPDATE fax_jobs SET file_path = ?2, updated_at = ?3 WHERE id = ?1",
            [&id as &dyn ToSql, &file_path, &now].as_ref(),
        )
        .map_err(InfraError::from)?;

        debug!(job_id = id, file_path, "recorded fax file path");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_pending_downloads(&self) -> Result<Vec<FaxJob>> {
        let conn = self.pool.get()?;

        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM fax_jobs
             WHERE direction = 'INBOUND' AND provider_fax_id IS NOT NULL AND file_path IS NULL
             ORDER BY created_at ASC"
        );
        let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
        let rows = stmt
            .query_map([], row_to_job)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        debug!(count = rows.len(), "found inbound jobs awaiting download");

        Ok(rows)
    }
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<FaxJob> {
    let direction: String = row.get(2)?;
    let direction = direction.parse::<FaxDirection>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(err))
    })?;

    Ok(FaxJob {
        id: row.get(0)?,
        provider_fax_id: row.get(1)?,
        direction,
        from_number: row.get(3)?,
        to_number: row.get(4)?,
        status: row.get(5)?,
        num_pages: row.get(6)?,
        file_path: row.get(7)?,
        mime_type: row.get(8)?,
        patient_id: row.get(9)?,
        user_id: row.get(10)?,
        callback_url: row.get(11)?,
        cover_page_id: row.get(12)?,
        error_code: row.get(13)?,
        error_message: row.get(14)?,
        provider_create_time: opt_datetime(row.get(15)?),
        provider_completed_time: opt_datetime(row.get(16)?),
        created_at: datetime_or_epoch(row.get(17)?),
        updated_at: datetime_or_epoch(row.get(18)?),
    })
}

fn opt_datetime(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

// Out-of-range stamps clamp to the epoch rather than failing the whole row.
fn datetime_or_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use faxgate_domain::constants::{STATUS_FAILURE, STATUS_IN_PROGRESS, STATUS_SUCCESS};
    use tempfile::TempDir;

    use super::super::sqlcipher_pool::SqlCipherPoolConfig;
    use super::*;

    fn setup_test_db() -> (Arc<SqlCipherPool>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let encryption_key = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

        let pool = Arc::new(
            SqlCipherPool::new(&db_path, encryption_key, SqlCipherPoolConfig::default()).unwrap(),
        );

        let conn = pool.get().unwrap();
        conn.execute_batch(include_str!("schema.sql")).unwrap();

        (pool, temp_dir)
    }

    fn provider_fax(id: &str, status: &str) -> ProviderFax {
        ProviderFax {
            id: id.to_string(),
            direction: Some(FaxDirection::Inbound),
            from_number: "+15550001111".to_string(),
            to_number: "+15552223333".to_string(),
            status: status.to_string(),
            num_pages: 2,
            error_code: None,
            error_message: None,
            callback_url: None,
            cover_page_id: None,
            create_time: Some(Utc::now()),
            completed_time: None,
            has_file: true,
        }
    }

    fn inbound_job(provider_id: &str) -> FaxJob {
        FaxJob::from_provider(&provider_fax(provider_id, STATUS_SUCCESS), FaxDirection::Inbound)
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let (pool, _temp) = setup_test_db();
        let repo = SqlCipherFaxJobRepository::new(pool);

        let job = inbound_job("FAX-100");
        assert!(repo.insert_if_absent(&job).await.unwrap());

        let found = repo.find_by_provider_id("FAX-100").await.unwrap().unwrap();
        assert_eq!(found.id, job.id);
        assert_eq!(found.direction, FaxDirection::Inbound);
        assert_eq!(found.from_number, "+15550001111");
        assert_eq!(found.status, STATUS_SUCCESS);
        assert_eq!(found.num_pages, 2);
        assert_eq!(
            found.provider_create_time.map(|t| t.timestamp()),
            job.provider_create_time.map(|t| t.timestamp())
        );

        let by_id = repo.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(by_id.provider_fax_id.as_deref(), Some("FAX-100"));

        assert!(repo.find_by_provider_id("FAX-999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_provider_ids_insert_once() {
        let (pool, _temp) = setup_test_db();
        let repo = SqlCipherFaxJobRepository::new(pool);

        assert!(repo.insert_if_absent(&inbound_job("FAX-200")).await.unwrap());
        assert!(!repo.insert_if_absent(&inbound_job("FAX-200")).await.unwrap());

        let rows = repo.list(&FaxJobFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn rows_without_provider_id_always_insert() {
        let (pool, _temp) = setup_test_db();
        let repo = SqlCipherFaxJobRepository::new(pool);

        let mut first = inbound_job("");
        first.provider_fax_id = None;
        let mut second = inbound_job("");
        second.provider_fax_id = None;

        assert!(repo.insert_if_absent(&first).await.unwrap());
        assert!(repo.insert_if_absent(&second).await.unwrap());

        let rows = repo.list(&FaxJobFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn status_update_merges_without_clearing_error_detail() {
        let (pool, _temp) = setup_test_db();
        let repo = SqlCipherFaxJobRepository::new(pool);

        let mut job = inbound_job("FAX-300");
        job.status = STATUS_FAILURE.to_string();
        job.error_code = Some("LINE_BUSY".to_string());
        job.error_message = Some("line busy".to_string());
        repo.insert_if_absent(&job).await.unwrap();

        // Detail-less update keeps the recorded failure detail.
        let affected =
            repo.apply_status_update("FAX-300", &provider_fax("FAX-300", STATUS_FAILURE)).await.unwrap();
        assert_eq!(affected, 1);

        let row = repo.find_by_provider_id("FAX-300").await.unwrap().unwrap();
        assert_eq!(row.error_code.as_deref(), Some("LINE_BUSY"));
        assert_eq!(row.error_message.as_deref(), Some("line busy"));

        // An update carrying detail replaces it.
        let mut update = provider_fax("FAX-300", STATUS_FAILURE);
        update.error_code = Some("NO_ANSWER".to_string());
        update.error_message = Some("no answer".to_string());
        repo.apply_status_update("FAX-300", &update).await.unwrap();

        let row = repo.find_by_provider_id("FAX-300").await.unwrap().unwrap();
        assert_eq!(row.error_message.as_deref(), Some("no answer"));
    }

    #[tokio::test]
    async fn status_update_for_unknown_id_affects_nothing() {
        let (pool, _temp) = setup_test_db();
        let repo = SqlCipherFaxJobRepository::new(pool);

        let affected = repo
            .apply_status_update("FAX-404", &provider_fax("FAX-404", STATUS_SUCCESS))
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn list_applies_direction_status_and_limit() {
        let (pool, _temp) = setup_test_db();
        let repo = SqlCipherFaxJobRepository::new(pool);

        let outbound = FaxJob::from_provider(
            &provider_fax("FAX-OUT", STATUS_IN_PROGRESS),
            FaxDirection::Outbound,
        );
        repo.insert_if_absent(&outbound).await.unwrap();
        repo.insert_if_absent(&inbound_job("FAX-IN-1")).await.unwrap();
        repo.insert_if_absent(&inbound_job("FAX-IN-2")).await.unwrap();

        let inbound = repo
            .list(&FaxJobFilter { direction: Some(FaxDirection::Inbound), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(inbound.len(), 2);

        let in_progress = repo
            .list(&FaxJobFilter {
                status: Some(STATUS_IN_PROGRESS.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].provider_fax_id.as_deref(), Some("FAX-OUT"));

        let limited =
            repo.list(&FaxJobFilter { limit: Some(1), ..Default::default() }).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn pending_downloads_are_inbound_rows_without_files() {
        let (pool, _temp) = setup_test_db();
        let repo = SqlCipherFaxJobRepository::new(pool);

        repo.insert_if_absent(&inbound_job("FAX-PENDING")).await.unwrap();

        let mut stored = inbound_job("FAX-STORED");
        stored.file_path = Some("/var/lib/faxgate/FAX-STORED.pdf".to_string());
        repo.insert_if_absent(&stored).await.unwrap();

        let outbound =
            FaxJob::from_provider(&provider_fax("FAX-OUT", STATUS_SUCCESS), FaxDirection::Outbound);
        repo.insert_if_absent(&outbound).await.unwrap();

        let pending = repo.find_pending_downloads().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].provider_fax_id.as_deref(), Some("FAX-PENDING"));
    }

    #[tokio::test]
    async fn set_file_path_updates_the_row() {
        let (pool, _temp) = setup_test_db();
        let repo = SqlCipherFaxJobRepository::new(pool);

        let job = inbound_job("FAX-500");
        repo.insert_if_absent(&job).await.unwrap();

        repo.set_file_path(&job.id, "/var/lib/faxgate/FAX-500.pdf").await.unwrap();

        let row = repo.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(row.file_path.as_deref(), Some("/var/lib/faxgate/FAX-500.pdf"));
        assert!(repo.find_pending_downloads().await.unwrap().is_empty());
    }
}
