//! Fax reconciliation service - core business logic
//!
//! Single authoritative place that turns provider responses and webhook
//! events into persisted fax-job rows and mutations. Two independent update
//! channels (webhook deliveries and polling) can race or replay; the
//! repository's insert-if-absent semantics on the provider fax ID absorb
//! both without duplicating rows.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use faxgate_domain::constants::PDF_FILE_TYPE;
use faxgate_domain::{
    FaxConfig, FaxDirection, FaxError, FaxJob, FaxJobFilter, FaxListFilters, FaxPage, ProviderFax,
    Result, SendFaxOptions, SendFaxRequest, WebhookDelivery,
};
use tracing::{debug, info, instrument, warn};

use super::ports::{FaxFileStore, FaxJobRepository, FaxProviderClient, PollCheckpointStore};

/// Fax reconciliation service
pub struct FaxService {
    client: Arc<dyn FaxProviderClient>,
    jobs: Arc<dyn FaxJobRepository>,
    files: Arc<dyn FaxFileStore>,
    checkpoints: Arc<dyn PollCheckpointStore>,
    config: FaxConfig,
}

impl FaxService {
    /// Create a new fax service
    pub fn new(
        client: Arc<dyn FaxProviderClient>,
        jobs: Arc<dyn FaxJobRepository>,
        files: Arc<dyn FaxFileStore>,
        checkpoints: Arc<dyn PollCheckpointStore>,
        config: &FaxConfig,
    ) -> Self {
        Self { client, jobs, files, checkpoints, config: config.clone() }
    }

    /// The configuration snapshot this service was built with
    pub fn config(&self) -> &FaxConfig {
        &self.config
    }

    fn is_ready(&self) -> bool {
        self.config.enabled && self.config.is_configured()
    }

    fn ensure_ready(&self) -> Result<()> {
        if !self.config.enabled {
            return Err(FaxError::ModuleDisabledOrUnconfigured("fax module is disabled".into()));
        }
        if !self.config.is_configured() {
            return Err(FaxError::ModuleDisabledOrUnconfigured(
                "provider credentials are not configured".into(),
            ));
        }
        Ok(())
    }

    /// Send an outbound fax and persist the resulting job row.
    ///
    /// The callback URL is attached only when the configured site address is
    /// publicly reachable; the provider cannot call back into a private
    /// network, so loopback and RFC 1918 addresses suppress it. If the remote
    /// send succeeds and persistence then fails, the fax exists remotely
    /// without a local row and the persistence error is surfaced as-is.
    #[instrument(skip(self, files, options))]
    pub async fn send_fax(
        &self,
        to: &str,
        files: Vec<PathBuf>,
        options: SendFaxOptions,
    ) -> Result<ProviderFax> {
        self.ensure_ready()?;

        let to = to.trim();
        if to.is_empty() {
            return Err(FaxError::InvalidInput("recipient number is required".into()));
        }
        let has_content_url = options.content_url.as_deref().is_some_and(|u| !u.is_empty());
        if files.is_empty() && !has_content_url {
            return Err(FaxError::InvalidInput(
                "at least one file or a content URL is required".into(),
            ));
        }

        let callback_url =
            options.callback_url.clone().or_else(|| self.config.default_callback_url());
        let request = SendFaxRequest {
            to: to.to_string(),
            from: options.from.clone(),
            files,
            content_url: options.content_url.clone(),
            callback_url,
            cover_page_id: options.cover_page_id.clone(),
            max_retries: Some(options.max_retries.unwrap_or(self.config.default_retry_count)),
        };

        let fax = self.client.send_fax(&request).await?;

        let mut job = FaxJob::from_provider(&fax, FaxDirection::Outbound);
        if job.to_number.is_empty() {
            job.to_number = request.to.clone();
        }
        if job.from_number.is_empty() {
            job.from_number = request.from.clone().unwrap_or_default();
        }
        if job.callback_url.is_none() {
            job.callback_url = request.callback_url.clone();
        }
        if job.cover_page_id.is_none() {
            job.cover_page_id = request.cover_page_id.clone();
        }
        job.patient_id = options.patient_id.clone();
        job.user_id = options.user_id.clone();

        let inserted = self.jobs.insert_if_absent(&job).await?;
        if !inserted {
            // A completion webhook can only race us after the provider
            // assigned the ID we are inserting under.
            debug!(fax_id = %fax.id, "send row already present; webhook arrived first");
        }

        info!(fax_id = %fax.id, status = %fax.status, "fax submitted");
        Ok(fax)
    }

    /// Fetch a single fax resource from the provider
    pub async fn get_fax(&self, fax_id: &str) -> Result<ProviderFax> {
        self.ensure_ready()?;
        self.client.get_fax(fax_id).await
    }

    /// List faxes on the provider side
    pub async fn list_remote(&self, filters: &FaxListFilters) -> Result<FaxPage> {
        self.ensure_ready()?;
        self.client.list_faxes(filters).await
    }

    /// Delete a fax resource on the provider side
    pub async fn delete_fax(&self, fax_id: &str) -> Result<()> {
        self.ensure_ready()?;
        self.client.delete_fax(fax_id).await
    }

    /// Download fax content, store it, and record the path on the local row
    /// when one exists. Returns the stored path.
    pub async fn download_and_save(&self, fax_id: &str) -> Result<String> {
        self.ensure_ready()?;
        let path = self.fetch_and_store(fax_id).await?;
        if let Some(job) = self.jobs.find_by_provider_id(fax_id).await? {
            self.jobs.set_file_path(&job.id, &path).await?;
        }
        Ok(path)
    }

    /// Process an `INCOMING_FAX` webhook delivery.
    ///
    /// Stores the attached content (PDF only) before inserting the INBOUND
    /// row, so a replayed delivery rewrites the same bytes to the same path
    /// and the insert-if-absent keeps the row unique. Returns whether a row
    /// was inserted.
    #[instrument(skip(self, delivery))]
    pub async fn process_incoming_fax(&self, delivery: &WebhookDelivery) -> Result<bool> {
        let fax = delivery
            .fax
            .as_ref()
            .ok_or_else(|| FaxError::InvalidWebhookPayload("missing fax payload".into()))?;
        if fax.id.is_empty() {
            return Err(FaxError::InvalidWebhookPayload("missing provider fax id".into()));
        }

        let mut job = FaxJob::from_provider(fax, FaxDirection::Inbound);

        if let Some(content) = &delivery.file {
            if delivery.file_type.as_deref() == Some(PDF_FILE_TYPE) {
                let path = self.files.store(&fax.id, content).await?;
                job.file_path = Some(path);
            } else {
                warn!(
                    fax_id = %fax.id,
                    file_type = ?delivery.file_type,
                    "unsupported attachment type; content not stored"
                );
            }
        }

        let inserted = self.jobs.insert_if_absent(&job).await?;
        if inserted {
            info!(fax_id = %fax.id, "incoming fax recorded");
        } else {
            debug!(fax_id = %fax.id, "incoming fax already recorded; delivery replayed");
        }
        Ok(inserted)
    }

    /// Process a `FAX_COMPLETED` webhook delivery.
    ///
    /// Update-only merge by provider ID; an unknown ID affects zero rows and
    /// is a silent no-op. Returns the number of rows affected.
    #[instrument(skip(self, delivery))]
    pub async fn process_fax_completed(&self, delivery: &WebhookDelivery) -> Result<usize> {
        let fax = delivery
            .fax
            .as_ref()
            .ok_or_else(|| FaxError::InvalidWebhookPayload("missing fax payload".into()))?;
        if fax.id.is_empty() {
            return Err(FaxError::InvalidWebhookPayload("missing provider fax id".into()));
        }

        let affected = self.jobs.apply_status_update(&fax.id, fax).await?;
        if affected == 0 {
            debug!(fax_id = %fax.id, "completion event for unknown fax id; ignored");
        } else {
            info!(fax_id = %fax.id, status = %fax.status, "fax completion recorded");
        }
        Ok(affected)
    }

    /// Poll the provider for inbound faxes created since the checkpoint.
    ///
    /// Pending downloads from earlier passes are retried first. Provider IDs
    /// already present locally are skipped; a failed content download still
    /// inserts the row (without a path) so the next pass retries it. The
    /// checkpoint advances unconditionally once the provider listing
    /// succeeded. Returns the number of newly inserted rows.
    #[instrument(skip(self))]
    pub async fn poll_incoming_faxes(&self) -> Result<usize> {
        self.ensure_ready()?;

        let checkpoint = self.checkpoints.last_poll_time().await?;
        let recovered = self.retry_pending_downloads().await;
        if recovered > 0 {
            info!(recovered, "recovered pending fax downloads");
        }

        let mut inserted = 0usize;
        let mut page: Option<u32> = None;
        loop {
            let filters = FaxListFilters {
                direction: Some(FaxDirection::Inbound),
                create_time: checkpoint,
                page,
                ..FaxListFilters::default()
            };
            let listing = self.client.list_faxes(&filters).await?;

            for fax in &listing.faxes {
                match self.ingest_polled_fax(fax).await {
                    Ok(true) => inserted += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!(fax_id = %fax.id, error = %err, "failed to ingest polled fax");
                    }
                }
            }

            if listing.total_pages == 0 || listing.page_number >= listing.total_pages {
                break;
            }
            page = Some(listing.page_number + 1);
        }

        self.checkpoints.set_last_poll_time(Utc::now()).await?;

        info!(inserted, "incoming fax poll completed");
        Ok(inserted)
    }

    /// Refresh in-flight jobs from the provider.
    ///
    /// Runs only when webhook callbacks cannot be relied on (no public
    /// callback URL) or status polling is explicitly enabled. A job
    /// qualifies when it is still in progress or failed without error
    /// detail; the merge is written only when something materially changed.
    /// Per-job fetch failures are logged and skipped.
    pub async fn refresh_in_flight(&self, jobs: Vec<FaxJob>) -> Result<Vec<FaxJob>> {
        if !self.refresh_allowed() {
            return Ok(jobs);
        }

        let mut refreshed = Vec::with_capacity(jobs.len());
        for mut job in jobs {
            let Some(provider_id) = job.provider_fax_id.clone() else {
                refreshed.push(job);
                continue;
            };
            if !job.needs_status_refresh() {
                refreshed.push(job);
                continue;
            }

            match self.client.get_fax(&provider_id).await {
                Ok(update) => {
                    if job.has_material_change(&update) {
                        match self.jobs.apply_status_update(&provider_id, &update).await {
                            Ok(_) => job.apply_update(&update),
                            Err(err) => {
                                warn!(
                                    fax_id = %provider_id,
                                    error = %err,
                                    "failed to persist status refresh"
                                );
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(fax_id = %provider_id, error = %err, "status refresh fetch failed");
                }
            }
            refreshed.push(job);
        }
        Ok(refreshed)
    }

    /// List local fax-job rows, newest first, refreshing in-flight statuses
    pub async fn list_jobs(&self, filter: &FaxJobFilter) -> Result<Vec<FaxJob>> {
        let jobs = self.jobs.list(filter).await?;
        self.refresh_in_flight(jobs).await
    }

    fn refresh_allowed(&self) -> bool {
        self.is_ready()
            && (!self.config.has_public_callback_url() || self.config.enable_status_polling)
    }

    async fn fetch_and_store(&self, fax_id: &str) -> Result<String> {
        let content = self.client.download_fax(fax_id).await?;
        self.files.store(fax_id, &content).await
    }

    async fn ingest_polled_fax(&self, fax: &ProviderFax) -> Result<bool> {
        if fax.id.is_empty() {
            warn!("provider listed a fax without an id; skipped");
            return Ok(false);
        }
        if self.jobs.find_by_provider_id(&fax.id).await?.is_some() {
            return Ok(false);
        }

        let mut job = FaxJob::from_provider(fax, FaxDirection::Inbound);
        if fax.has_file && self.config.auto_receive {
            match self.fetch_and_store(&fax.id).await {
                Ok(path) => job.file_path = Some(path),
                Err(err) => {
                    warn!(
                        fax_id = %fax.id,
                        error = %err,
                        "content download failed; row kept for retry"
                    );
                }
            }
        }

        self.jobs.insert_if_absent(&job).await
    }

    async fn retry_pending_downloads(&self) -> usize {
        let pending = match self.jobs.find_pending_downloads().await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "could not list pending downloads");
                return 0;
            }
        };

        let mut recovered = 0usize;
        for job in pending {
            let Some(provider_id) = job.provider_fax_id.as_deref() else {
                continue;
            };
            match self.fetch_and_store(provider_id).await {
                Ok(path) => {
                    if let Err(err) = self.jobs.set_file_path(&job.id, &path).await {
                        warn!(
                            fax_id = %provider_id,
                            error = %err,
                            "stored content but could not update the row"
                        );
                    } else {
                        recovered += 1;
                    }
                }
                Err(err) => {
                    debug!(fax_id = %provider_id, error = %err, "pending download still failing");
                }
            }
        }
        recovered
    }
}
