use anyhow::{Context, Result};
use clap::Args;

use crate::config::Config;
use crate::director::{AnnotationLevel, GeminiDirector, SceneDirector};

#[derive(Args)]
pub struct AnnotateArgs {
    /// The object to explain, e.g. "Red Fox"
    pub object: String,

    /// Scene context handed to the reasoning backend
    #[arg(long, default_value = "Exploring a 3D scene")]
    pub context: String,

    /// Explanation level: child, teen, or adult
    #[arg(short, long, default_value = "teen")]
    pub level: String,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub async fn run(args: AnnotateArgs, config_path: Option<&str>) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let level = AnnotationLevel::parse(&args.level)
        .with_context(|| format!("level must be child, teen, or adult (got \"{}\")", args.level))?;

    let director = GeminiDirector::new(&config.director)?;
    let annotation = director
        .annotate_object(&args.object, &args.context, level)
        .await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&annotation)?),
        _ => {
            println!("{}", annotation.title);
            println!("{}", annotation.explanation);
            if !annotation.fun_fact.is_empty() {
                println!("fun fact: {}", annotation.fun_fact);
            }
            if !annotation.related_topics.is_empty() {
                println!("related: {}", annotation.related_topics.join(", "));
            }
        }
    }

    Ok(())
}
