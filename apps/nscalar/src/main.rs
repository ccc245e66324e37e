//! # nscalar
//!
//! Evaluate neural scalar graphs described in TOML.
//!
//! ## Usage
//!
//! ```bash
//! # Evaluate every named node
//! nscalar eval -c graph.toml
//!
//! # Evaluate selected names, JSON output
//! nscalar --json-mode eval -c graph.toml -n output
//!
//! # Pack and inspect blueprints
//! nscalar pack -c graph.toml -o blueprints.bin
//! nscalar inspect -f blueprints.bin
//! ```

use clap::Parser;
use nscalar::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // NSCALAR_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("NSCALAR_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "nscalar=debug"
    } else {
        "nscalar=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        eprintln!("nscalar v{}", env!("CARGO_PKG_VERSION"));
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
