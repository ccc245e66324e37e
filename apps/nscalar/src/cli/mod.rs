//! # nscalar CLI Module
//!
//! ## Available Commands
//!
//! - `eval` - Build a graph from a TOML description and evaluate named nodes
//! - `pack` - Write the blueprints of a description in binary form
//! - `inspect` - List the blueprints of a packed file

mod commands;

use clap::{Parser, Subcommand};
use nscalar_core::ScalarError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// nscalar - lazily evaluated neural scalars
///
/// Builds graphs of scalars driven by small feed-forward networks and
/// evaluates them on demand.
#[derive(Parser, Debug)]
#[command(name = "nscalar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a graph and evaluate named nodes
    Eval {
        /// Path to the TOML graph description
        #[arg(short, long)]
        config: PathBuf,

        /// Names to evaluate (default: every named node)
        #[arg(short, long)]
        name: Vec<String>,
    },

    /// Pack the blueprints of a description into a binary file
    Pack {
        /// Path to the TOML graph description
        #[arg(short, long)]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the blueprints of a packed file
    Inspect {
        /// Packed blueprint file
        #[arg(short, long)]
        file: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), ScalarError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Eval { config, name } => cmd_eval(&config, &name, json_mode),
        Commands::Pack { config, output } => cmd_pack(&config, &output, json_mode),
        Commands::Inspect { file } => cmd_inspect(&file, json_mode),
    }
}
