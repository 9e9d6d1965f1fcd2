//! Kino Tracker CLI - Replay Scripted Player Sessions
//!
//! Features:
//! - Replay a JSON scenario against simulated players
//! - Built-in player swap demo
//! - Text, JSON and table output of everything reported

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod scenario;

/// Kino Tracker CLI - Playback analytics toolkit
#[derive(Parser)]
#[command(name = "kino-tracker")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Replay player sessions through the Kino analytics tracker", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file
    Replay {
        /// Path to scenario JSON
        scenario: PathBuf,

        /// Tracker configuration JSON, overrides the scenario's
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replay the built-in player swap scenario
    Demo,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    kino_tracker::init();

    match cli.command {
        Commands::Replay { scenario, config } => {
            commands::replay(&scenario, config.as_deref(), &cli.format)?;
        }
        Commands::Demo => {
            commands::demo(&cli.format)?;
        }
    }

    Ok(())
}
