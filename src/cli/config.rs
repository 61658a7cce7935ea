use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration as TOML
    Show,

    /// Write a default config file if none exists
    Init,

    /// Print the config file location
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = Config::load_with(config_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Init => {
            let path = match config_path {
                Some(path) => std::path::PathBuf::from(path),
                None => Config::config_path()?,
            };
            if path.exists() {
                println!("config already exists at {}", path.display());
            } else {
                Config::default().save_to(&path)?;
                println!("wrote default config to {}", path.display());
            }
        }
        ConfigCommands::Path => {
            let path = match config_path {
                Some(path) => std::path::PathBuf::from(path),
                None => Config::config_path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}
