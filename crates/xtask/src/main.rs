//! Development tasks for the RTS workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo run -p xtask -- <command>`

mod commands;
mod dirs;

use anyhow::Result;
use clap::Parser;
use commands::{LintRules, ReplayRun};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Development tasks for the RTS workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for rulesets and replays", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Load a content directory and check every actor type
    LintRules(LintRules),

    /// Re-run a recorded replay and verify its sync hashes
    Replay(ReplayRun),
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    // Load .env file if it exists (for RTS_REPLAY_DIR and RUST_LOG)
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::LintRules(cmd) => cmd.execute(),
        Command::Replay(cmd) => cmd.execute(),
    }
}
