pub mod annotate;
pub mod compose;
pub mod config;
pub mod search;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "diorama")]
#[command(author, version, about = "Ask-and-explore 3D scene generator")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(short, long, global = true, env = "DIORAMA_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compose a scene from a free-text query
    Compose(compose::ComposeArgs),

    /// Search the model catalog directly
    Search(search::SearchArgs),

    /// Generate an educational annotation for an object
    Annotate(annotate::AnnotateArgs),

    /// Run the HTTP API server
    Serve(serve::ServeArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}
