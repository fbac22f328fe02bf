use clap::{Parser, Subcommand};

mod cli;
mod config;
mod core;
mod error;
mod services;
mod utils;

use config::Config;
use error::Result;
use services::SimpleServices;

#[derive(Parser)]
#[command(name = "statdesk")]
#[command(about = "Administrative backend for managing and publishing statistical releases")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Acting user for mutations (email)
    #[arg(short, long)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialise the stores and blob storage
    Init(cli::init::InitArgs),

    /// Manage publications
    Publication(cli::publication::PublicationArgs),

    /// Manage releases: creation, amendment, approval
    Release(cli::release::ReleaseArgs),

    /// Manage page content: sections, blocks, tiles
    Content(cli::content::ContentArgs),

    /// Manage key statistics and data blocks
    Stats(cli::stats::StatsArgs),

    /// Manage data, ancillary and image files
    Files(cli::files::FilesArgs),

    /// Show configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::logging::init_logging(cli.verbose).map_err(error::StatDeskError::Internal)?;

    let config = Config::load(cli.config.as_deref()).map_err(error::StatDeskError::Internal)?;
    let services = SimpleServices::new(config);

    let actor = cli.actor.as_deref();
    match cli.command {
        Commands::Init(args) => cli::init::execute(args, &services).await,
        Commands::Publication(args) => cli::publication::execute(args, &services).await,
        Commands::Release(args) => cli::release::execute(args, &services, actor).await,
        Commands::Content(args) => cli::content::execute(args, &services).await,
        Commands::Stats(args) => cli::stats::execute(args, &services).await,
        Commands::Files(args) => cli::files::execute(args, &services, actor).await,
        Commands::Config(args) => cli::config::execute(args, &services.config()).await,
    }
}
