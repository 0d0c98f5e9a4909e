//! Domain types and models

pub mod config;
pub mod fax;
pub mod webhook;

pub use config::{AuthMethod, FaxConfig, Region};
pub use fax::{
    FaxDirection, FaxJob, FaxJobFilter, FaxListFilters, FaxPage, ProviderFax, SendFaxOptions,
    SendFaxRequest,
};
pub use webhook::{WebhookDelivery, WebhookEventKind};
