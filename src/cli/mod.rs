//! The `ferrite-lab` command line.

pub mod args;
mod commands;
pub mod logging;


pub use args::{Cli, Command};
pub use commands::{evaluate_checkpoint, evaluate_confusion, run_command};

/// Parses arguments without exiting the process on error.
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    use clap::Parser;
    Cli::try_parse_from(args)
}
