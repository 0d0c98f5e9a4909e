//! Wire-format types for the provider's fax API (v3).
//!
//! Field names follow the provider's camelCase JSON. Everything is defaulted
//! because listing responses routinely omit fields the single-resource
//! endpoint includes (`hasFile` in particular).

use chrono::{DateTime, Utc};
use faxgate_domain::constants::STATUS_UNKNOWN;
use faxgate_domain::{FaxDirection, FaxPage, ProviderFax};
use serde::{Deserialize, Serialize};

fn default_status() -> String {
    STATUS_UNKNOWN.to_string()
}

/// Fax resource as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinchFax {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub number_of_pages: i64,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub cover_page_id: Option<String>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_time: Option<DateTime<Utc>>,
    /// Omitted by some responses; absent means no stored content.
    #[serde(default)]
    pub has_file: bool,
}

impl SinchFax {
    /// Normalize into the domain view. Unrecognized direction strings map to
    /// `None` rather than failing the whole payload.
    pub fn into_domain(self) -> ProviderFax {
        let direction = self.direction.as_deref().and_then(|d| d.parse::<FaxDirection>().ok());
        ProviderFax {
            id: self.id,
            direction,
            from_number: self.from,
            to_number: self.to,
            status: self.status,
            num_pages: self.number_of_pages,
            error_code: self.error_code,
            error_message: self.error_message,
            callback_url: self.callback_url,
            cover_page_id: self.cover_page_id,
            create_time: self.create_time,
            completed_time: self.completed_time,
            has_file: self.has_file,
        }
    }
}

/// One page of the provider's fax listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinchFaxListResponse {
    #[serde(default)]
    pub faxes: Vec<SinchFax>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_items: u64,
}

impl SinchFaxListResponse {
    pub fn into_domain(self) -> FaxPage {
        FaxPage {
            faxes: self.faxes.into_iter().map(SinchFax::into_domain).collect(),
            page_number: self.page_number,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}
