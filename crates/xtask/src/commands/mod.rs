//! xtask subcommands

mod lint_rules;
mod replay;

pub use lint_rules::LintRules;
pub use replay::ReplayRun;
