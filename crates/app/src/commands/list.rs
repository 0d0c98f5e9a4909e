//! List command - show local fax jobs, newest first

use clap::Args;
use faxgate_domain::{FaxDirection, FaxJobFilter};

use crate::context::AppContext;

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    /// Filter by direction (inbound or outbound)
    #[arg(long)]
    pub direction: Option<FaxDirection>,

    /// Filter by provider status string (e.g. IN_PROGRESS, FAILURE)
    #[arg(long)]
    pub status: Option<String>,

    /// Maximum number of rows
    #[arg(long)]
    pub limit: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the list command
pub async fn execute(ctx: &AppContext, args: ListArgs) -> anyhow::Result<()> {
    let filter =
        FaxJobFilter { direction: args.direction, status: args.status, limit: args.limit };

    let jobs = ctx.fax_service.list_jobs(&filter).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("No fax jobs found");
        return Ok(());
    }

    for job in &jobs {
        let provider_id = job.provider_fax_id.as_deref().unwrap_or("-");
        let counterpart = match job.direction {
            FaxDirection::Outbound => &job.to_number,
            FaxDirection::Inbound => &job.from_number,
        };
        println!(
            "{}  {:8}  {:12}  {:>3}p  {}  {}",
            job.created_at.format("%Y-%m-%d %H:%M"),
            job.direction,
            job.status,
            job.num_pages,
            counterpart,
            provider_id,
        );
    }

    Ok(())
}
