mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fuelwatch-cli")]
#[command(about = "Seixal 95-octane price pipeline, run from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the refresh pipeline once and print the payload JSON
    Snapshot {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Run the refresh pipeline once and push the payload to a server's ingest endpoint
    Push {
        /// Full ingest URL, e.g. http://localhost:3000/ingest
        #[arg(long, env = "FUELWATCH_INGEST_ENDPOINT")]
        endpoint: String,
    },
    /// Fetch one raw upstream document and show what the extractor finds in it
    Probe {
        /// Station id to fetch (defaults to the first registry station)
        #[arg(long)]
        station: Option<String>,

        /// Write the raw upstream body to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = fuelwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Snapshot { pretty } => commands::run_snapshot(&config, pretty).await,
        Commands::Push { endpoint } => commands::run_push(&config, &endpoint).await,
        Commands::Probe { station, save } => {
            commands::run_probe(&config, station.as_deref(), save.as_deref()).await
        }
    }
}
