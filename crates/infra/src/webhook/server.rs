//! Lifecycle of the webhook HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use faxgate_core::FaxService;
use faxgate_domain::{FaxConfig, FaxError, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::handlers::{router, WebhookState};

/// Webhook server bound to the configured address.
///
/// Serving happens on a background task. Dropping the handle aborts the task;
/// call [`WebhookServer::shutdown`] to stop gracefully.
pub struct WebhookServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl WebhookServer {
    /// Bind the listener and start serving webhook requests.
    pub async fn start(config: &FaxConfig, service: Arc<FaxService>) -> Result<Self> {
        let listener = TcpListener::bind(&config.webhook_bind_addr).await.map_err(|err| {
            FaxError::Config(format!(
                "failed to bind webhook server on {}: {err}",
                config.webhook_bind_addr
            ))
        })?;

        let addr = listener.local_addr().map_err(|err| {
            FaxError::Config(format!("failed to determine webhook server address: {err}"))
        })?;

        let app = router(WebhookState { service, enabled: config.enable_webhooks });

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
            {
                error!(error = %err, "webhook server error");
            }
        });

        info!(%addr, webhooks_enabled = config.enable_webhooks, "webhook server listening");

        Ok(Self { addr, shutdown, handle: Some(handle) })
    }

    /// Address the server is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    error!(error = %err, "webhook server task panicked");
                }
            }
        }
    }
}

impl Drop for WebhookServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}
