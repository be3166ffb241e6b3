//! Replay verification command
//!
//! Rebuilds the recorded setup from a replay file, re-executes every frame
//! and compares each sync hash with the recorded one.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use rts_content::{ContentFactory, TraitFactory};
use rts_runtime::{Replay, RuntimeError};

use crate::dirs;

/// Re-run a recorded replay and verify its sync hashes
#[derive(Parser, Debug)]
pub struct ReplayRun {
    /// Replay file (`.jsonl`)
    pub path: Option<PathBuf>,

    /// Content directory; defaults to the one recorded in the replay
    #[arg(long)]
    pub content: Option<PathBuf>,

    /// Use the most recent replay in the replay directory
    #[arg(long, conflicts_with = "path")]
    pub latest: bool,

    /// Print the hash of every frame
    #[arg(short, long)]
    pub verbose: bool,
}

impl ReplayRun {
    pub fn execute(self) -> Result<()> {
        let path = self.resolve_path()?;
        let replay = Replay::load(&path)
            .with_context(|| format!("Failed to load replay {}", path.display()))?;

        let content_dir = self
            .content
            .clone()
            .or_else(|| replay.header.content.clone())
            .context("Replay does not record its content directory; pass --content")?;
        let ruleset = ContentFactory::new(&content_dir)
            .load_ruleset(&TraitFactory::with_stock_traits())?;

        println!(
            "{} {} ({} frames, seed {}, {} players)",
            style("Replaying").bold(),
            style(path.display()).cyan(),
            replay.frames.len(),
            replay.header.seed,
            replay.header.players.len()
        );

        match replay.play(Arc::new(ruleset)) {
            Ok(hashes) => {
                if self.verbose {
                    for (frame, hash) in replay.frames.iter().zip(&hashes) {
                        println!("  frame {:>6}  {}", frame.frame, style(hash).dim());
                    }
                }
                let final_hash = hashes
                    .last()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} {} frames match, final hash {}",
                    style("✓").green().bold(),
                    hashes.len(),
                    final_hash
                );
                Ok(())
            }
            Err(RuntimeError::ReplayDiverged {
                frame,
                expected,
                got,
            }) => {
                eprintln!(
                    "{} Diverged at frame {}: recorded {}, computed {}",
                    style("✗").red().bold(),
                    frame,
                    expected,
                    got
                );
                anyhow::bail!("replay diverged at frame {frame}");
            }
            Err(err) => Err(err.into()),
        }
    }

    fn resolve_path(&self) -> Result<PathBuf> {
        match (&self.path, self.latest) {
            (Some(path), _) => Ok(path.clone()),
            (None, true) => dirs::find_latest_file(&dirs::replay_dir()),
            (None, false) => anyhow::bail!("Pass a replay file or --latest"),
        }
    }
}
