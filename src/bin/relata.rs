//! Relata CLI binary.

use std::process;

use clap::Parser;
use relata::cli::{RelataArgs, execute_command, init_tracing};

fn main() {
    // Parse command line arguments using clap
    let args = RelataArgs::parse();

    init_tracing(args.verbosity());

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
