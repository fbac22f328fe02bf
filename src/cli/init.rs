use clap::Args;
use tracing::info;

use crate::error::Result;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct InitArgs {}

pub async fn execute(_args: InitArgs, services: &SimpleServices) -> Result<()> {
    let config = services.config();

    // Opening the stores runs any outstanding migrations.
    services.create_database().await?;
    services.create_stats_database().await?;
    info!("Stores initialised");

    println!("Initialised statdesk");
    println!("  Content store:    {}", config.content_database_path.display());
    println!("  Statistics store: {}", config.statistics_database_path.display());
    println!("  Blob storage:     {}", config.blob_storage_path.display());

    Ok(())
}
