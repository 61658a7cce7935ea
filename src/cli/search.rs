use anyhow::Result;
use clap::Args;

use crate::catalog::create_catalog;
use crate::config::Config;

#[derive(Args)]
pub struct SearchArgs {
    /// Search term, e.g. "fox"
    pub term: String,

    /// Maximum number of results
    #[arg(short, long, default_value_t = 8)]
    pub limit: usize,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub async fn run(args: SearchArgs, config_path: Option<&str>) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let catalog = create_catalog(&config.catalog)?;

    let outcome = catalog.search(&args.term, args.limit.max(1)).await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome)?),
        _ => {
            if outcome.models.is_empty() {
                println!("no models found for \"{}\"", args.term);
                return Ok(());
            }
            for model in &outcome.models {
                println!(
                    "{} by {} ({}) {}",
                    model.title, model.author, model.license, model.download_url,
                );
            }
        }
    }

    Ok(())
}
