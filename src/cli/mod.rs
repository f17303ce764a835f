pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, StoreBackend};

#[derive(Parser)]
#[command(name = "character-api")]
#[command(about = "Character catalog REST API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Store backend to use (postgres or json), overrides STORE_BACKEND")]
    pub backend: Option<StoreBackend>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,

        #[arg(long, help = "Address to bind, overrides HOST")]
        host: Option<String>,
    },

    #[command(about = "Load seed characters into the configured store")]
    Seed {
        #[arg(long, default_value = "data/seed.json", help = "JSON array of characters to insert")]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let mut config = AppConfig::from_env()?;
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }
    tracing::info!("Starting in {:?} mode with {} store", config.environment, config.store.backend.as_str());

    match cli.command.unwrap_or(Commands::Serve { port: None, host: None }) {
        Commands::Serve { port, host } => commands::serve::handle(config, host, port).await,
        Commands::Seed { file } => commands::seed::handle(config, &file, output_format).await,
    }
}
