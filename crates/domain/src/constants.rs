//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! fax gateway.

// Provider status vocabulary (free-form strings passed through unmodified;
// these are the values the provider is known to report)
pub const STATUS_QUEUED: &str = "QUEUED";
pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILURE: &str = "FAILURE";
pub const STATUS_UNKNOWN: &str = "UNKNOWN";

// Webhook event names on the wire
pub const EVENT_INCOMING_FAX: &str = "INCOMING_FAX";
pub const EVENT_FAX_COMPLETED: &str = "FAX_COMPLETED";

// Provider interaction
pub const PROVIDER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const PDF_FILE_TYPE: &str = "PDF";
pub const FAX_MIME_TYPE: &str = "application/pdf";

// Webhook receiver
pub const WEBHOOK_PATH: &str = "/fax/webhook";
pub const DEFAULT_WEBHOOK_BIND_ADDR: &str = "127.0.0.1:8090";

// Polling
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

// Persistence
pub const DEFAULT_DB_POOL_SIZE: u32 = 8;
pub const DEFAULT_LIST_LIMIT: u32 = 50;
