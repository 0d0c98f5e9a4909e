//! Serve command - run the webhook receiver and poll scheduler until ctrl-c

use std::sync::Arc;

use faxgate_infra::scheduling::{PollScheduler, PollSchedulerConfig};
use faxgate_infra::webhook::WebhookServer;
use tracing::{info, warn};

use crate::context::AppContext;

/// Execute the serve command
pub async fn execute(ctx: &AppContext) -> anyhow::Result<()> {
    let health = ctx.health_check().await;
    if health.is_healthy {
        info!(score = health.score, "gateway health check passed");
    } else {
        for component in health.components.iter().filter(|c| !c.is_healthy) {
            warn!(
                component = %component.name,
                message = component.message.as_deref().unwrap_or(""),
                "component unhealthy"
            );
        }
        warn!(score = health.score, "gateway starting degraded");
    }

    let server = WebhookServer::start(&ctx.config, Arc::clone(&ctx.fax_service)).await?;

    let scheduler_config = PollSchedulerConfig::from_fax_config(&ctx.config);
    let mut scheduler = if scheduler_config.is_active() {
        let mut scheduler = PollScheduler::new(scheduler_config, Arc::clone(&ctx.fax_service));
        scheduler.start().await?;
        Some(scheduler)
    } else {
        info!("no polling jobs enabled; scheduler not started");
        None
    };

    info!(addr = %server.local_addr(), "faxgate serving; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.stop().await?;
    }
    server.shutdown().await;

    Ok(())
}
