//! CLI module for mysqld-orchestrator
//!
//! Provides the container entry commands:
//! - run / master / slave: orchestrate a start and supervise the daemon
//! - client: exec the client against the local daemon
//! - config: dry-run configuration resolution

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, RoleArg, StartArgs};
pub use commands::{client, config, run_command, start};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};

use crate::observability::{log_event_with_fields, Event};

/// Parse arguments, run the command and return the process exit code
pub fn run() -> i32 {
    let cli = Cli::parse_args();
    match run_command(&cli.start, &cli.command) {
        Ok(code) => code,
        Err(e) => {
            let code = e.exit_code();
            let code_text = code.to_string();
            let message = e.to_string();
            log_event_with_fields(
                Event::OrchestrationAborted,
                &[
                    ("code", e.code()),
                    ("exit_code", code_text.as_str()),
                    ("message", message.as_str()),
                ],
            );
            if matches!(cli.command, Command::Config { .. }) {
                let _ = write_error(e.code(), &message);
            }
            code
        }
    }
}
