//! Ruleset lint command
//!
//! Loads a content directory the same way a game does, then spawns every actor
//! type into a scratch world and checks that each order it advertises is
//! claimed by one of its resolvers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use rts_content::{ContentFactory, LOCATION_INIT, TraitFactory};
use rts_core::{
    Capability, CellPos, InitValues, Order, OrderOutcome, Players, Ruleset, SimConfig, Target,
    World,
};

/// Load a content directory and check every actor type
#[derive(Parser, Debug)]
pub struct LintRules {
    /// Content directory holding `config.toml` and `rules/*.ron`
    #[arg(default_value = "data")]
    pub data_dir: PathBuf,
}

impl LintRules {
    pub fn execute(self) -> Result<()> {
        let content = ContentFactory::new(&self.data_dir);
        let config = content.load_config()?;
        let ruleset = Arc::new(content.load_ruleset(&TraitFactory::with_stock_traits())?);

        println!(
            "{} Loaded {} actor types from {}",
            style("✓").green().bold(),
            ruleset.len(),
            style(self.data_dir.display()).cyan()
        );

        let mut problems = 0usize;
        for template in ruleset.templates() {
            if template.name() == config.world_actor_type {
                continue;
            }
            match lint_actor(&ruleset, &config, template.name()) {
                Ok(unresolved) if unresolved.is_empty() => {
                    println!("  {} {}", style("✓").green(), template.name());
                }
                Ok(unresolved) => {
                    problems += unresolved.len();
                    for order_id in unresolved {
                        println!(
                            "  {} {}: order `{}` has no resolver",
                            style("✗").red().bold(),
                            template.name(),
                            order_id
                        );
                    }
                }
                Err(err) => {
                    problems += 1;
                    println!(
                        "  {} {}: {:#}",
                        style("!").yellow().bold(),
                        template.name(),
                        err
                    );
                }
            }
        }

        if problems > 0 {
            anyhow::bail!("{} problem(s) found", problems);
        }
        Ok(())
    }
}

/// Spawns `actor_type` alone and returns the advertised orders nothing claims.
fn lint_actor(ruleset: &Arc<Ruleset>, config: &SimConfig, actor_type: &str) -> Result<Vec<String>> {
    let mut players = Players::new();
    let owner = players.add("Lint", "lint")?;
    let mut world = World::new(Arc::clone(ruleset), players, config.clone(), 0)?;

    let init = InitValues::new().with(LOCATION_INIT, CellPos::ORIGIN);
    let id = world
        .spawn(actor_type, owner, &init)
        .with_context(|| format!("failed to spawn `{actor_type}`"))?;

    let order_ids: Vec<String> = world
        .actor(id)
        .map(|actor| {
            actor
                .traits()
                .query(Capability::IssueOrder, |t| t.as_issue_order())
                .flat_map(|(_, issuer)| {
                    issuer
                        .orders()
                        .into_iter()
                        .map(|targeter| targeter.order_id().to_string())
                        .collect::<Vec<_>>()
                })
                .collect()
        })
        .unwrap_or_default();

    // A neighbouring cell is a valid target for every stock order.
    let target = Target::cell(CellPos::new(1, 1));
    let mut unresolved = Vec::new();
    for order_id in order_ids {
        let order = Order::new(&order_id, id, target, false);
        if world.dispatch_order(&order) == OrderOutcome::Unclaimed {
            unresolved.push(order_id);
        }
    }
    Ok(unresolved)
}
