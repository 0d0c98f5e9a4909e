//! Download command - fetch fax content into the document store

use clap::Args;

use crate::context::AppContext;

/// Arguments for the download command
#[derive(Args)]
pub struct DownloadArgs {
    /// Provider fax ID
    pub fax_id: String,
}

/// Execute the download command
pub async fn execute(ctx: &AppContext, args: DownloadArgs) -> anyhow::Result<()> {
    let path = ctx.fax_service.download_and_save(&args.fax_id).await?;
    println!("Saved to {path}");
    Ok(())
}
