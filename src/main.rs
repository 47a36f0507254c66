mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dashsync_core::DashsyncConfig;

#[derive(Parser)]
#[command(name = "dashsync")]
#[command(about = "Inspect, export, import and follow the company dashboard's data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how many entries each collection holds
    Status,
    /// Write the stored data to a JSON file
    Export {
        /// Output file (defaults to the configured export filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the stored data with an exported JSON file
    Import { path: PathBuf },
    /// Run a dashboard instance and follow updates from other instances
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = DashsyncConfig::load()?;

    match cli.command {
        Commands::Status => commands::status::run(&config).await,
        Commands::Export { output } => commands::export::run(&config, output).await,
        Commands::Import { path } => commands::import::run(&config, path).await,
        Commands::Watch => commands::watch::run(&config).await,
    }
}
