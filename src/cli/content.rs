use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::core::model::TileKind;
use crate::error::Result;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct ContentArgs {
    #[command(subcommand)]
    command: ContentCommands,
}

#[derive(Subcommand)]
enum ContentCommands {
    /// Print a page's full content tree as JSON
    Tree { page: Uuid },

    /// Create a standalone content page
    CreatePage {
        #[arg(long)]
        title: String,

        #[arg(long)]
        slug: String,
    },

    /// Add a section, shifting later siblings when the position is taken
    AddSection {
        page: Uuid,

        #[arg(long)]
        order: Option<i64>,

        #[arg(long)]
        heading: String,
    },

    /// Apply a complete new section order
    ReorderSections {
        page: Uuid,

        /// Every current section id, in the desired order
        ids: Vec<Uuid>,
    },

    RemoveSection { page: Uuid, section: Uuid },

    /// Add an html block to a section
    AddHtml {
        page: Uuid,
        section: Uuid,

        #[arg(long)]
        order: Option<i64>,

        #[arg(long)]
        body: String,
    },

    /// Add a tile-group block to a section
    AddTileGroup {
        page: Uuid,
        section: Uuid,

        #[arg(long)]
        order: Option<i64>,
    },

    /// Add a stat tile to a tile-group block
    AddStatTile {
        page: Uuid,
        section: Uuid,
        block: Uuid,

        #[arg(long)]
        title: String,

        #[arg(long)]
        statistic: String,

        #[arg(long)]
        trend: Option<String>,
    },

    /// Create an embeddable resource and attach it as an embed block
    AddEmbed {
        page: Uuid,
        section: Uuid,

        #[arg(long)]
        title: String,

        #[arg(long)]
        url: String,
    },

    /// Attach a review comment to a block
    AddComment {
        page: Uuid,
        section: Uuid,
        block: Uuid,

        #[arg(long)]
        content: String,

        #[arg(long)]
        author: String,
    },

    /// Replace the body of an html block
    UpdateHtml {
        page: Uuid,
        section: Uuid,
        block: Uuid,

        #[arg(long)]
        body: String,
    },

    /// Apply a complete new block order within a section
    ReorderBlocks {
        page: Uuid,
        section: Uuid,
        ids: Vec<Uuid>,
    },

    RemoveBlock {
        page: Uuid,
        section: Uuid,
        block: Uuid,
    },
}

pub async fn execute(args: ContentArgs, services: &SimpleServices) -> Result<()> {
    let set = services.create_services().await?;
    let content = &set.content;

    match args.command {
        ContentCommands::Tree { page } => {
            let tree = content.get_page_tree(page).await?;
            println!("{}", serde_json::to_string_pretty(&tree).map_err(anyhow::Error::from)?);
        }
        ContentCommands::CreatePage { title, slug } => {
            let page = content.create_page(&title, &slug).await?;
            println!("Created page {} ({})", page.slug, page.id);
        }
        ContentCommands::AddSection {
            page,
            order,
            heading,
        } => {
            let section = content.add_section(page, order, &heading).await?;
            println!("Added section {} at position {}", section.id, section.ord);
        }
        ContentCommands::ReorderSections { page, ids } => {
            content.reorder_sections(page, ids).await?;
            println!("Sections reordered");
        }
        ContentCommands::RemoveSection { page, section } => {
            content.remove_section(page, section).await?;
            println!("Removed section {section}");
        }
        ContentCommands::AddHtml {
            page,
            section,
            order,
            body,
        } => {
            let block = content.add_html_block(page, section, order, &body).await?;
            println!("Added html block {} at position {}", block.id, block.ord);
        }
        ContentCommands::AddTileGroup {
            page,
            section,
            order,
        } => {
            let block = content.add_tile_group_block(page, section, order).await?;
            println!("Added tile group {} at position {}", block.id, block.ord);
        }
        ContentCommands::AddStatTile {
            page,
            section,
            block,
            title,
            statistic,
            trend,
        } => {
            let tile = content
                .add_tile(
                    page,
                    section,
                    block,
                    None,
                    TileKind::Stat {
                        title,
                        statistic,
                        trend,
                    },
                )
                .await?;
            println!("Added tile {} at position {}", tile.id, tile.ord);
        }
        ContentCommands::AddEmbed {
            page,
            section,
            title,
            url,
        } => {
            let embed = content.create_embed(&title, &url).await?;
            let block = content.add_embed_block(page, section, None, embed.id).await?;
            println!("Added embed block {} at position {}", block.id, block.ord);
        }
        ContentCommands::AddComment {
            page,
            section,
            block,
            content: comment_content,
            author,
        } => {
            let comment = content
                .add_comment(page, section, block, &comment_content, &author)
                .await?;
            println!("Added comment {}", comment.id);
        }
        ContentCommands::UpdateHtml {
            page,
            section,
            block,
            body,
        } => {
            content.update_block_body(page, section, block, &body).await?;
            println!("Updated block {block}");
        }
        ContentCommands::ReorderBlocks { page, section, ids } => {
            content.reorder_blocks(page, section, ids).await?;
            println!("Blocks reordered");
        }
        ContentCommands::RemoveBlock {
            page,
            section,
            block,
        } => {
            content.remove_block(page, section, block).await?;
            println!("Removed block {block}");
        }
    }

    Ok(())
}
