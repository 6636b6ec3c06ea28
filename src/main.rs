//! mysqld-orchestrator entry point
//!
//! All logic lives in the CLI module; main only turns its result into the
//! process exit code.

use mysqld_orchestrator::cli;

fn main() {
    std::process::exit(cli::run());
}
