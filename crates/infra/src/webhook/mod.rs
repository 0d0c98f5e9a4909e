//! HTTP receiver for provider fax event callbacks.

mod handlers;
mod server;

pub use server::WebhookServer;
