//! Sinch Fax API v3 integration.

mod client;
mod types;

pub use client::SinchFaxClient;
pub use types::{SinchFax, SinchFaxListResponse};
