//! Befund CLI - directive template engine.
//!
//! Provides commands for:
//! - `schema`: Print the inputs a template needs as JSON
//! - `render`: Render a template with bindings
//! - `check`: Validate a template and report skipped directives
//! - `eval`: Evaluate a score formula

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, EvalArgs, RenderArgs, SchemaArgs};
use error::CliError;
use output::Output;

/// Befund - directive template engine for clinical notes.
#[derive(Parser)]
#[command(name = "befund", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover befund.toml).
    #[arg(short, long, global = true, env = "BEFUND_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the input schema of a template as JSON.
    Schema(SchemaArgs),
    /// Render a template.
    Render(RenderArgs),
    /// Check a template for errors and skipped directives.
    Check(CheckArgs),
    /// Evaluate a score formula.
    Eval(EvalArgs),
}

impl Commands {
    fn execute(self, config: Option<&std::path::Path>) -> Result<(), CliError> {
        match self {
            Self::Schema(args) => args.execute(config),
            Self::Render(args) => args.execute(config),
            Self::Check(args) => args.execute(config),
            Self::Eval(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.command.execute(cli.config.as_deref()) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
