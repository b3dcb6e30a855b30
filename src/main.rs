use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use mapquery::{AppState, CommandRecorder, MapQueryConfig, telemetry::init_tracing, web};

#[derive(Debug, Parser)]
#[command(name = "mapquery", version)]
#[command(about = "Natural-language map queries: extraction, geocoding and routing")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the extraction for a query as JSON
    Extract {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Print extraction, map commands and summary for a query as JSON
    Visualize {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        MapQueryConfig::load_from_path(cli.config.clone()).context("Failed to load configuration")?;
    init_tracing(&config.logging, cli.verbose);

    let state = AppState::from_config(&config).context("Failed to set up upstream clients")?;

    match cli.command {
        Command::Serve { port } => {
            let mut server = config.server.clone();
            if let Some(port) = port {
                server.port = port;
            }
            web::run(&server, state).await?;
        }
        Command::Extract { query } => {
            let extraction = state.extractor.extract(&query.join(" ")).await?;
            println!("{}", serde_json::to_string_pretty(&extraction)?);
        }
        Command::Visualize { query } => {
            let extraction = state.extractor.extract(&query.join(" ")).await?;
            let mut canvas = CommandRecorder::new();
            let summary = state.applier.apply(&extraction, &mut canvas).await;
            let output = json!({
                "extraction": extraction,
                "commands": canvas.commands(),
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
