//! Command implementations.

mod evaluate;
mod lsmap;
mod metadata;
mod summary;
mod train;

pub use evaluate::{evaluate_checkpoint, evaluate_confusion};

use crate::cli::args::{Cli, Command};
use crate::error::Result;

/// Executes the parsed command.
pub fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Train(args) => train::run_train(args),
        Command::Evaluate(args) => evaluate::run_evaluate(args),
        Command::Summary(args) => summary::run_summary(args),
        Command::ExtractLsmap(args) => lsmap::run_extract_lsmap(args),
        Command::ExtractMetadata(args) => metadata::run_extract_metadata(args),
    }
}
