use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::core::model::KeyStatKind;
use crate::core::services::{DataBlockInput, DataBlockKeyStatInput, TextKeyStatInput};
use crate::error::Result;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    command: StatsCommands,
}

#[derive(Subcommand)]
enum StatsCommands {
    /// Append a free-text key statistic
    AddText {
        release: Uuid,

        #[arg(long)]
        title: String,

        #[arg(long)]
        statistic: String,

        #[arg(long)]
        trend: Option<String>,
    },

    /// Append a key statistic backed by an unattached data-block version
    AddDataBlock {
        release: Uuid,

        #[arg(long)]
        data_block: Uuid,

        #[arg(long)]
        trend: Option<String>,
    },

    /// List a release's key statistics in order
    List { release: Uuid },

    /// Apply a complete new key statistic order
    Reorder { release: Uuid, ids: Vec<Uuid> },

    /// Delete a key statistic, closing the ordering gap
    Delete { release: Uuid, id: Uuid },

    /// Create a data-block version on a release
    CreateDataBlock {
        release: Uuid,

        #[arg(long)]
        name: String,

        /// Saved query as JSON
        #[arg(long, default_value = "{}")]
        query: String,

        /// Table configuration as JSON
        #[arg(long, default_value = "{}")]
        table_config: String,
    },

    /// List data-block versions not yet attached to any content
    ListUnattached { release: Uuid },

    /// Highlight a data-block version on the table tool
    AddFeaturedTable {
        release: Uuid,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        data_block: Uuid,
    },
}

pub async fn execute(args: StatsArgs, services: &SimpleServices) -> Result<()> {
    let set = services.create_services().await?;

    match args.command {
        StatsCommands::AddText {
            release,
            title,
            statistic,
            trend,
        } => {
            let stat = set
                .key_stats
                .create_text(
                    release,
                    TextKeyStatInput {
                        title,
                        statistic,
                        trend,
                        guidance_title: None,
                        guidance_text: None,
                    },
                )
                .await?;
            println!("Added key statistic {} at position {}", stat.id, stat.ord);
        }
        StatsCommands::AddDataBlock {
            release,
            data_block,
            trend,
        } => {
            let stat = set
                .key_stats
                .create_data_block(
                    release,
                    DataBlockKeyStatInput {
                        data_block_version_id: data_block,
                        trend,
                        guidance_title: None,
                        guidance_text: None,
                    },
                )
                .await?;
            println!("Added key statistic {} at position {}", stat.id, stat.ord);
        }
        StatsCommands::List { release } => {
            for stat in set.key_stats.list(release).await? {
                match &stat.kind {
                    KeyStatKind::Text { title, statistic } => {
                        println!("{}  {}  {}  {}", stat.ord, stat.id, title, statistic);
                    }
                    KeyStatKind::DataBlock {
                        data_block_version_id,
                    } => {
                        println!(
                            "{}  {}  data block {}",
                            stat.ord, stat.id, data_block_version_id
                        );
                    }
                }
            }
        }
        StatsCommands::Reorder { release, ids } => {
            set.key_stats.reorder(release, ids).await?;
            println!("Key statistics reordered");
        }
        StatsCommands::Delete { release, id } => {
            set.key_stats.delete(release, id).await?;
            println!("Deleted key statistic {id}");
        }
        StatsCommands::CreateDataBlock {
            release,
            name,
            query,
            table_config,
        } => {
            let version = set
                .data_blocks
                .create(
                    release,
                    DataBlockInput {
                        name,
                        heading: None,
                        source: None,
                        query,
                        table_config,
                        chart_config: None,
                    },
                )
                .await?;
            println!("Created data block {} ({})", version.name, version.id);
        }
        StatsCommands::ListUnattached { release } => {
            for version in set.data_blocks.list_unattached(release).await? {
                println!("{}  {}", version.id, version.name);
            }
        }
        StatsCommands::AddFeaturedTable {
            release,
            name,
            description,
            data_block,
        } => {
            let table = set
                .data_blocks
                .create_featured_table(release, &name, description, data_block)
                .await?;
            println!("Created featured table {} ({})", table.name, table.id);
        }
    }

    Ok(())
}
