//! Poll-incoming command - one manual poll pass for new inbound faxes

use faxgate_domain::FaxError;
use tracing::warn;

use crate::context::AppContext;

/// Execute the poll-incoming command
///
/// Exit contract: a disabled module is an error (non-zero exit); disabled
/// incoming polling is a warning and a clean exit; otherwise one poll pass
/// runs and the outcome is printed.
pub async fn execute(ctx: &AppContext) -> anyhow::Result<()> {
    if !ctx.config.enabled {
        return Err(FaxError::ModuleDisabledOrUnconfigured("fax module is disabled".into()).into());
    }
    if !ctx.config.enable_incoming_polling {
        warn!("incoming fax polling is disabled; nothing to do");
        return Ok(());
    }

    let processed = ctx.fax_service.poll_incoming_faxes().await?;
    let last_poll = ctx.checkpoints.last_poll_time().await?;

    println!("Processed {processed} new inbound fax(es)");
    match last_poll {
        Some(at) => println!("Last poll: {}", at.to_rfc3339()),
        None => println!("Last poll: Never"),
    }

    Ok(())
}
