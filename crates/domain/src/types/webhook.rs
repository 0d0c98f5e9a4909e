//! Webhook event types
//!
//! The provider dispatches events by name on the wire; locally they map onto
//! a closed enum with an explicit variant for names this gateway does not
//! understand, so unknown events can be acknowledged without being dropped
//! silently.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{EVENT_FAX_COMPLETED, EVENT_INCOMING_FAX};
use crate::types::fax::ProviderFax;

/// Kind of a provider webhook event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum WebhookEventKind {
    /// A new inbound fax arrived (`INCOMING_FAX`).
    IncomingFax,
    /// A fax transmission finished (`FAX_COMPLETED`).
    FaxCompleted,
    /// Any event name this gateway does not understand; carried verbatim.
    Unrecognized(String),
}

impl WebhookEventKind {
    /// Map a wire event name onto the known kinds, exact match only.
    pub fn parse(raw: &str) -> Self {
        match raw {
            EVENT_INCOMING_FAX => Self::IncomingFax,
            EVENT_FAX_COMPLETED => Self::FaxCompleted,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Wire representation of the event name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::IncomingFax => EVENT_INCOMING_FAX,
            Self::FaxCompleted => EVENT_FAX_COMPLETED,
            Self::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for WebhookEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed webhook delivery, content-type differences already erased.
///
/// The receiver decodes multipart file parts and base64 JSON bodies into raw
/// bytes before the delivery reaches the reconciliation service.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    pub event: WebhookEventKind,
    pub event_time: Option<String>,
    pub fax: Option<ProviderFax>,
    pub file: Option<Vec<u8>>,
    pub file_type: Option<String>,
}

impl WebhookDelivery {
    /// Delivery with no fax payload, used for unrecognized events.
    pub fn bare(event: WebhookEventKind) -> Self {
        Self { event, event_time: None, fax: None, file: None, file_type: None }
    }
}
