//! Get command - fetch a single fax resource from the provider

use clap::Args;

use crate::context::AppContext;

/// Arguments for the get command
#[derive(Args)]
pub struct GetArgs {
    /// Provider fax ID
    pub fax_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the get command
pub async fn execute(ctx: &AppContext, args: GetArgs) -> anyhow::Result<()> {
    let fax = ctx.fax_service.get_fax(&args.fax_id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&fax)?);
        return Ok(());
    }

    println!("Fax:       {}", fax.id);
    if let Some(direction) = fax.direction {
        println!("Direction: {direction}");
    }
    println!("From:      {}", fax.from_number);
    println!("To:        {}", fax.to_number);
    println!("Status:    {}", fax.status);
    println!("Pages:     {}", fax.num_pages);
    if let Some(created) = fax.create_time {
        println!("Created:   {}", created.to_rfc3339());
    }
    if let Some(completed) = fax.completed_time {
        println!("Completed: {}", completed.to_rfc3339());
    }
    if let Some(code) = fax.error_code.as_deref() {
        println!("Error:     {code}");
    }
    if let Some(message) = fax.error_message.as_deref() {
        println!("Detail:    {message}");
    }

    Ok(())
}
