//! # Tally CLI Module
//!
//! This module implements the CLI interface for Tally.
//!
//! ## Available Commands
//!
//! - `run` - Replay a scenario and print every tick
//! - `snapshot` - Replay a scenario and write the last result in wire format
//! - `decode` - Print a wire-format result
//! - `config` - Print the effective collector configuration

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_core::TallyError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tally - incremental container aggregation
///
/// Replays scripted inventories through the aggregation cache, one poll
/// per tick, exactly as a renderer would drive it.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Collector config file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the maximum number of distinct entries per result
    #[arg(long, global = true)]
    pub max_entries: Option<usize>,

    /// Override the rescan throttle window, in ticks
    #[arg(long, global = true)]
    pub throttle_ticks: Option<u64>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario tick by tick
    Run {
        /// Path to the scenario file (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Number of ticks to poll
        #[arg(short, long, default_value = "20")]
        ticks: u64,

        /// First tick
        #[arg(long, default_value = "0")]
        from: u64,
    },

    /// Replay a scenario and write the last result in wire format
    Snapshot {
        /// Path to the scenario file (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Number of ticks to poll before writing
        #[arg(short, long, default_value = "20")]
        ticks: u64,
    },

    /// Decode and print a wire-format result
    Decode {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the effective collector configuration
    Config,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), TallyError> {
    let overrides = ConfigOverrides {
        max_entries: cli.max_entries,
        throttle_ticks: cli.throttle_ticks,
    };
    let config = resolve_config(cli.config.as_deref(), &overrides)?;
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::info!(?config, "effective collector configuration");
    }

    match cli.command {
        Some(Commands::Run { file, ticks, from }) => cmd_run(&file, config, json_mode, from, ticks),
        Some(Commands::Snapshot {
            file,
            output,
            ticks,
        }) => cmd_snapshot(&file, &output, config, ticks),
        Some(Commands::Decode { input }) => cmd_decode(&input, json_mode),
        Some(Commands::Config) | None => cmd_config(&config),
    }
}
