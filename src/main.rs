//! Cascade CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cascade")]
#[command(about = "Delete a note together with everything it links to", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Vault root path (defaults to current directory)
    #[arg(short = 'r', long, default_value = ".", global = true)]
    vault: PathBuf,

    /// Settings file (defaults to <vault>/.cascade/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what deleting a note would remove
    Plan {
        /// Root note: vault path, filesystem path or note name
        root: String,
    },
    /// Delete a note's linked documents
    Delete {
        /// Root note: vault path, filesystem path or note name
        root: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective settings
    Config,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("cascade={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Cascade v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Vault root: {}", cli.vault.display());

    match cli.command {
        Commands::Plan { root } => {
            let settings = commands::load_settings(&cli.vault, cli.config.as_deref())?;
            commands::plan(&cli.vault, &root, &settings).await
        }
        Commands::Delete { root, yes, json } => {
            let settings = commands::load_settings(&cli.vault, cli.config.as_deref())?;
            commands::delete(&cli.vault, &root, &settings, yes, json).await
        }
        Commands::Config => {
            let settings = commands::load_settings(&cli.vault, cli.config.as_deref())?;
            commands::show_config(&settings)
        }
        Commands::Version => {
            println!("Cascade v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
