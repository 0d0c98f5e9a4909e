//! Send command - submit an outbound fax to the provider

use std::path::PathBuf;

use clap::Args;
use faxgate_domain::SendFaxOptions;

use crate::context::AppContext;

/// Arguments for the send command
#[derive(Args)]
pub struct SendArgs {
    /// Recipient fax number (E.164)
    #[arg(long)]
    pub to: String,

    /// Local PDF file to attach; repeat for multiple documents
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Sender fax number override
    #[arg(long)]
    pub from: Option<String>,

    /// Publicly reachable content URL, alternative to local files
    #[arg(long)]
    pub content_url: Option<String>,

    /// Provider cover page identifier
    #[arg(long)]
    pub cover_page_id: Option<String>,

    /// Provider-side redelivery attempts
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Patient record to associate with the job
    #[arg(long)]
    pub patient_id: Option<String>,

    /// Sending user to associate with the job
    #[arg(long)]
    pub user_id: Option<String>,
}

/// Execute the send command
pub async fn execute(ctx: &AppContext, args: SendArgs) -> anyhow::Result<()> {
    let options = SendFaxOptions {
        from: args.from,
        content_url: args.content_url,
        callback_url: None,
        cover_page_id: args.cover_page_id,
        max_retries: args.max_retries,
        patient_id: args.patient_id,
        user_id: args.user_id,
    };

    let fax = ctx.fax_service.send_fax(&args.to, args.files, options).await?;

    println!("Fax {} submitted ({})", fax.id, fax.status);
    Ok(())
}
