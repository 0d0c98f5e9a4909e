//! Faxgate - Sinch fax gateway
//!
//! Main entry point for the faxgate daemon and CLI. Commands share one
//! [`AppContext`] built from the resolved configuration.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod utils;

use context::AppContext;

/// Fax gateway for the Sinch Fax API v3
#[derive(Parser)]
#[command(name = "faxgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook receiver and poll scheduler
    Serve,

    /// Poll the provider once for new inbound faxes
    PollIncoming,

    /// Send an outbound fax
    Send(commands::send::SendArgs),

    /// List local fax jobs
    List(commands::list::ListArgs),

    /// Fetch a single fax from the provider
    Get(commands::get::GetArgs),

    /// Download fax content into the document store
    Download(commands::download::DownloadArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = faxgate_infra::config::load()?;
    let ctx = AppContext::new(config).await?;

    run(&ctx, cli).await
}

async fn run(ctx: &AppContext, cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve => commands::serve::execute(ctx).await,
        Commands::PollIncoming => commands::poll::execute(ctx).await,
        Commands::Send(args) => commands::send::execute(ctx, args).await,
        Commands::List(args) => commands::list::execute(ctx, args).await,
        Commands::Get(args) => commands::get::execute(ctx, args).await,
        Commands::Download(args) => commands::download::execute(ctx, args).await,
    }
}
