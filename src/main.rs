use anyhow::Result;
use clap::Parser;

use diorama::Config;
use diorama::cli::{self, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config_level = Config::load_with(cli.config.as_deref())
        .map(|config| config.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config_level
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Compose(args) => cli::compose::run(args, config_path).await,
        Commands::Search(args) => cli::search::run(args, config_path).await,
        Commands::Annotate(args) => cli::annotate::run(args, config_path).await,
        Commands::Serve(args) => cli::serve::run(args, config_path).await,
        Commands::Config(args) => cli::config::run(args, config_path).await,
    }
}
