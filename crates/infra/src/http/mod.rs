//! HTTP client plumbing shared by provider integrations.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
