use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::{debug, info};

use crate::catalog::create_catalog;
use crate::config::Config;
use crate::director::{GeminiDirector, SceneDirector};
use crate::render::{RecordingSink, RenderSink};
use crate::scene::SceneComposer;

#[derive(Args)]
pub struct ComposeArgs {
    /// What to explore, e.g. "a dog in a park"
    pub query: String,

    /// Skip the reasoning backend and search the catalog directly
    #[arg(long)]
    pub quick: bool,

    /// Run the layout refinement pass after composing
    #[arg(long)]
    pub validate: bool,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub async fn run(args: ComposeArgs, config_path: Option<&str>) -> Result<()> {
    let config = Config::load_with(config_path)?;
    let director: Arc<dyn SceneDirector> = Arc::new(GeminiDirector::new(&config.director)?);
    let catalog = create_catalog(&config.catalog)?;
    let composer = SceneComposer::new(director, catalog, config.catalog.candidate_limit);

    let mut scene = if args.quick {
        composer.quick_compose(&args.query).await?
    } else {
        composer
            .compose_from_query(&args.query, |scene| {
                debug!(
                    progress = scene.progress,
                    status = ?scene.status,
                    resolved = scene.elements.len(),
                    "compose progress"
                );
            })
            .await?
    };

    if args.validate && !scene.elements.is_empty() {
        let report = composer.refine_layout(&mut scene, &args.query).await?;
        info!(
            score = report.layout_score,
            feedback = %report.overall_feedback,
            "layout refined"
        );
    }

    // Hand the result to a recording sink so the output reflects exactly
    // what a host engine would receive.
    let sink = RecordingSink::default();
    sink.set_camera_position(scene.composition.camera_position);
    sink.set_ambiance(scene.composition.ambiance);
    sink.load_elements(&mut scene.elements, &mut |loaded, total| {
        debug!(loaded, total, "element loaded");
    })
    .await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&scene)?),
        _ => {
            println!("{}", scene.composition.title);
            if !scene.composition.description.is_empty() {
                println!("{}", scene.composition.description);
            }
            println!(
                "ambiance: {}  camera: ({:.1}, {:.1}, {:.1})",
                scene.composition.ambiance.as_str(),
                scene.composition.camera_position.x,
                scene.composition.camera_position.y,
                scene.composition.camera_position.z,
            );
            for element in &scene.elements {
                println!(
                    "  - {} [{}] at ({:.1}, {:.1}, {:.1}) scale {:.2}",
                    element.spec.name,
                    element.asset.title,
                    element.spec.position.x,
                    element.spec.position.y,
                    element.spec.position.z,
                    element.spec.scale,
                );
            }
            if scene.elements.len() < scene.composition.elements.len() {
                println!(
                    "({} of {} planned elements had no usable model)",
                    scene.composition.elements.len() - scene.elements.len(),
                    scene.composition.elements.len(),
                );
            }
            let related = composer.suggest_related(&scene);
            if !related.is_empty() {
                println!("explore next: {}", related.join(", "));
            }
        }
    }

    Ok(())
}
