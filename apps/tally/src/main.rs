//! # Tally - Incremental Container Aggregation
//!
//! The main binary for Tally.
//!
//! This application provides:
//! - Scenario replay, one collector poll per tick
//! - Wire-format snapshots of the shown result
//! - Config inspection
//!
//! ## Usage
//!
//! ```bash
//! tally run -f chest.json -t 40
//! tally snapshot -f chest.json -o chest.taly
//! tally decode -i chest.taly --json-mode
//! tally config --max-entries 20
//! ```

use clap::Parser;
use tally::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // TALLY_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TALLY_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tally=info,tally_core=info".into());

    // Logs go to stderr, stdout carries command output.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Tally startup banner.
fn print_banner() {
    println!(
        r#"
  tally v{}
  merged, bounded, amortized
"#,
        env!("CARGO_PKG_VERSION")
    );
}
