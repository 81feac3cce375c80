//! slidesync: reconcile a live slide deck with a desired one.
//!
//! # Usage
//!
//! ```text
//! slidesync plan <current> <desired> [--json]
//! slidesync apply <deck> <desired> [--storage <dir>] [--dry-run]
//! ```
//!
//! Decks are YAML files. Logs go to stderr; set `RUST_LOG` to adjust.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{apply::ApplyArgs, plan::PlanArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "slidesync",
    version,
    about = "Plan and apply the minimal edits that turn one slide deck into another",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the actions that would turn <current> into <desired>.
    Plan(PlanArgs),

    /// Apply <desired> to the deck file <deck>, uploading new images.
    Apply(ApplyArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Plan(args) => args.run(),
        Commands::Apply(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
