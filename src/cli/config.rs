use clap::{Args, Subcommand};

use crate::config::Config;
use crate::error::Result;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,
}

pub async fn execute(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let rendered = toml::to_string_pretty(config).map_err(anyhow::Error::from)?;
            print!("{rendered}");
        }
        ConfigCommands::Path => {
            let path = Config::config_path().map_err(anyhow::Error::from)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
