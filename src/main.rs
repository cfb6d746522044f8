// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "frameflow")]
#[command(about = "Flow-control core for producer/consumer frame pipelines")]
#[command(version = frameflow::constants::app_version())]
struct Cli {
    /// Config file (default: ~/.config/frameflow/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the synthetic capture pipeline and report flow statistics
    Simulate {
        /// Duration in seconds (overrides config)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Capture rate in fps: 15, 24, 30 or 60 (overrides config)
        #[arg(short, long)]
        fps: Option<u32>,

        /// Worker in-flight limit (overrides config)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a single flow-control decision
    Decide {
        #[command(subcommand)]
        decision: cli::DecideCommand,
    },

    /// Show the effective configuration
    Config {
        /// Print the default config file path instead
        #[arg(long)]
        path: bool,

        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=frameflow=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Simulate {
            duration,
            fps,
            limit,
            json,
        } => cli::simulate(config_path, duration, fps, limit, json),
        Commands::Decide { decision } => cli::decide(decision),
        Commands::Config { path, save } => cli::show_config(config_path, path, save),
    }
}
