//! Port interfaces for fax reconciliation
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faxgate_domain::{
    FaxJob, FaxJobFilter, FaxListFilters, FaxPage, ProviderFax, Result, SendFaxRequest,
};

/// Trait for the remote fax provider API
#[async_trait]
pub trait FaxProviderClient: Send + Sync {
    /// Submit an outbound fax and return the provider's immediate response
    async fn send_fax(&self, request: &SendFaxRequest) -> Result<ProviderFax>;

    /// Fetch a single fax resource by provider ID
    async fn get_fax(&self, fax_id: &str) -> Result<ProviderFax>;

    /// List faxes matching the filters, one page at a time
    async fn list_faxes(&self, filters: &FaxListFilters) -> Result<FaxPage>;

    /// Download the stored content of a fax
    async fn download_fax(&self, fax_id: &str) -> Result<Vec<u8>>;

    /// Delete a fax resource on the provider side
    async fn delete_fax(&self, fax_id: &str) -> Result<()>;
}

/// Trait for persisting fax-job rows
#[async_trait]
pub trait FaxJobRepository: Send + Sync {
    /// Insert a row unless one with the same provider fax ID already exists.
    ///
    /// Returns `true` when a row was inserted. Rows without a provider ID
    /// are always inserted.
    async fn insert_if_absent(&self, job: &FaxJob) -> Result<bool>;

    /// Find a row by its local surrogate key
    async fn find_by_id(&self, id: &str) -> Result<Option<FaxJob>>;

    /// Find a row by its provider fax ID
    async fn find_by_provider_id(&self, provider_fax_id: &str) -> Result<Option<FaxJob>>;

    /// List rows newest first, honoring the filter's direction/status/limit
    async fn list(&self, filter: &FaxJobFilter) -> Result<Vec<FaxJob>>;

    /// Merge a provider status update into the row with this provider ID.
    ///
    /// Returns the number of rows affected; an unknown ID affects zero rows
    /// and is not an error. Error fields are only overwritten when the
    /// update carries them.
    async fn apply_status_update(
        &self,
        provider_fax_id: &str,
        update: &ProviderFax,
    ) -> Result<usize>;

    /// Record the stored content path for a row
    async fn set_file_path(&self, id: &str, file_path: &str) -> Result<()>;

    /// Inbound rows with a provider ID but no stored content yet
    async fn find_pending_downloads(&self) -> Result<Vec<FaxJob>>;
}

/// Trait for storing fax content on disk
#[async_trait]
pub trait FaxFileStore: Send + Sync {
    /// Store content for a fax and return the stored path
    async fn store(&self, fax_id: &str, content: &[u8]) -> Result<String>;
}

/// Trait for the incoming-poll checkpoint
#[async_trait]
pub trait PollCheckpointStore: Send + Sync {
    /// Timestamp of the last completed incoming poll, if any
    async fn last_poll_time(&self) -> Result<Option<DateTime<Utc>>>;

    /// Advance the checkpoint
    async fn set_last_poll_time(&self, at: DateTime<Utc>) -> Result<()>;
}
