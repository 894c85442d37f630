//! Command Line Interface for Relata.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub mod args;
pub mod commands;
pub mod output;

// Re-export commonly used types
pub use args::*;
pub use commands::*;
pub use output::*;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "RELATA_LOG";

/// Default log filter for a verbosity level.
pub fn default_log_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "relata=warn,warn",
        2 => "relata=info,warn",
        _ => "relata=debug,info",
    }
}

/// Install the global `tracing` subscriber, writing to stderr.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}
