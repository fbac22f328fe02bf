use clap::{Args, Subcommand};

use crate::error::Result;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct PublicationArgs {
    #[command(subcommand)]
    command: PublicationCommands,
}

#[derive(Subcommand)]
enum PublicationCommands {
    /// Create a publication lineage
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        slug: String,
    },

    /// List all publications
    List,
}

pub async fn execute(args: PublicationArgs, services: &SimpleServices) -> Result<()> {
    let set = services.create_services().await?;

    match args.command {
        PublicationCommands::Create { title, slug } => {
            let publication = set.releases.create_publication(&title, &slug).await?;
            println!("Created publication {} ({})", publication.slug, publication.id);
        }
        PublicationCommands::List => {
            for publication in set.releases.list_publications().await? {
                let latest = set
                    .releases
                    .latest_release(publication.id)
                    .await?
                    .map(|release| format!("v{} ({})", release.version, release.approval_status.as_str()))
                    .unwrap_or_else(|| "no releases".to_string());
                println!(
                    "{}  {}  {}  {}",
                    publication.id, publication.slug, publication.title, latest
                );
            }
        }
    }

    Ok(())
}
