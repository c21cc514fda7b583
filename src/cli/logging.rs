//! Logger setup for the binary.

use log::LevelFilter;

/// Level implied by the global flags.
pub fn level_for(verbose: bool, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initialises `env_logger`. `RUST_LOG` still wins when set.
pub fn init(verbose: bool, quiet: bool) {
    let default = level_for(verbose, quiet).to_string().to_lowercase();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
