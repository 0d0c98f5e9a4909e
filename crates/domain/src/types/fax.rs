//! Fax job and provider resource types
//!
//! These types represent the persisted fax-job row and the normalized view of
//! the provider's fax resource. Status values stay free-form strings so any
//! vocabulary the provider reports is stored unmodified.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{FAX_MIME_TYPE, STATUS_FAILURE, STATUS_IN_PROGRESS};
use crate::errors::FaxError;

/// Transmission direction of a fax job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaxDirection {
    Outbound,
    Inbound,
}

impl FaxDirection {
    /// Wire/database representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outbound => "OUTBOUND",
            Self::Inbound => "INBOUND",
        }
    }
}

impl fmt::Display for FaxDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FaxDirection {
    type Err = FaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OUTBOUND" => Ok(Self::Outbound),
            "INBOUND" => Ok(Self::Inbound),
            other => Err(FaxError::Serialization(format!("unknown fax direction: {other}"))),
        }
    }
}

/// Normalized view of the provider's fax resource.
///
/// Produced by the wire layer from provider JSON; missing fields take the
/// provider-compatible defaults (`UNKNOWN` status, zero pages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFax {
    pub id: String,
    pub direction: Option<FaxDirection>,
    pub from_number: String,
    pub to_number: String,
    pub status: String,
    pub num_pages: i64,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub callback_url: Option<String>,
    pub cover_page_id: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
    /// Whether the provider reports stored content for this fax.
    pub has_file: bool,
}

impl ProviderFax {
    /// Error detail is considered present only when the message is non-empty.
    pub fn has_error_detail(&self) -> bool {
        self.error_message.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// One page of a provider fax listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaxPage {
    pub faxes: Vec<ProviderFax>,
    pub page_number: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

/// Persisted fax-job row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaxJob {
    /// Local surrogate key (UUID v7).
    pub id: String,
    /// Provider-assigned fax ID; immutable and unique once set.
    pub provider_fax_id: Option<String>,
    pub direction: FaxDirection,
    pub from_number: String,
    pub to_number: String,
    /// Free-form provider status vocabulary.
    pub status: String,
    pub num_pages: i64,
    pub file_path: Option<String>,
    pub mime_type: String,
    pub patient_id: Option<String>,
    pub user_id: Option<String>,
    pub callback_url: Option<String>,
    pub cover_page_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub provider_create_time: Option<DateTime<Utc>>,
    pub provider_completed_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FaxJob {
    /// Build a new local row from a provider resource.
    ///
    /// An empty provider ID is stored as `None` so the uniqueness constraint
    /// on provider IDs never trips over placeholder values.
    pub fn from_provider(fax: &ProviderFax, direction: FaxDirection) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            provider_fax_id: (!fax.id.is_empty()).then(|| fax.id.clone()),
            direction,
            from_number: fax.from_number.clone(),
            to_number: fax.to_number.clone(),
            status: fax.status.clone(),
            num_pages: fax.num_pages,
            file_path: None,
            mime_type: FAX_MIME_TYPE.to_string(),
            patient_id: None,
            user_id: None,
            callback_url: fax.callback_url.clone(),
            cover_page_id: fax.cover_page_id.clone(),
            error_code: fax.error_code.clone(),
            error_message: fax.error_message.clone(),
            provider_create_time: fax.create_time,
            provider_completed_time: fax.completed_time,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the list-view refresh should query the provider for this job:
    /// still in progress, or failed without error detail yet.
    pub fn needs_status_refresh(&self) -> bool {
        match self.status.as_str() {
            STATUS_IN_PROGRESS => true,
            STATUS_FAILURE => self.error_message.as_deref().unwrap_or("").is_empty(),
            _ => false,
        }
    }

    /// Material-change test for the status-merge policy: an update is worth
    /// writing when the status differs, the page count differs, or error
    /// detail became available where none existed before.
    pub fn has_material_change(&self, update: &ProviderFax) -> bool {
        self.status != update.status
            || self.num_pages != update.num_pages
            || (update.has_error_detail()
                && self.error_message.as_deref().unwrap_or("").is_empty())
    }

    /// Merge a provider status update into this row. Status, page count and
    /// completion time always take the provider's latest values; error fields
    /// are only overwritten when the update actually carries them, so a
    /// detail-less update never clears recorded failure detail.
    pub fn apply_update(&mut self, update: &ProviderFax) {
        self.status = update.status.clone();
        self.num_pages = update.num_pages;
        self.provider_completed_time = update.completed_time;
        if update.error_code.as_deref().is_some_and(|c| !c.is_empty()) {
            self.error_code = update.error_code.clone();
        }
        if update.has_error_detail() {
            self.error_message = update.error_message.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Parameters handed to the provider client for one send call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendFaxRequest {
    pub to: String,
    pub from: Option<String>,
    /// Local files attached as binary parts.
    pub files: Vec<PathBuf>,
    /// Remote content URL, alternative to local files.
    pub content_url: Option<String>,
    pub callback_url: Option<String>,
    pub cover_page_id: Option<String>,
    /// Provider-side redelivery attempts, passed through unmodified.
    pub max_retries: Option<u32>,
}

/// Caller-supplied options for a send, merged with configuration defaults.
#[derive(Debug, Clone, Default)]
pub struct SendFaxOptions {
    pub from: Option<String>,
    /// Remote content URL, alternative to attaching local files.
    pub content_url: Option<String>,
    pub callback_url: Option<String>,
    pub cover_page_id: Option<String>,
    pub max_retries: Option<u32>,
    pub patient_id: Option<String>,
    pub user_id: Option<String>,
}

/// Filters for the provider fax listing.
#[derive(Debug, Clone, Default)]
pub struct FaxListFilters {
    pub service_id: Option<String>,
    pub direction: Option<FaxDirection>,
    pub status: Option<String>,
    pub to: Option<String>,
    pub from: Option<String>,
    /// Creation-time lower bound (the poll checkpoint).
    pub create_time: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Filters for listing local fax-job rows.
#[derive(Debug, Clone, Default)]
pub struct FaxJobFilter {
    pub direction: Option<FaxDirection>,
    pub status: Option<String>,
    pub limit: Option<u32>,
}
