//! CLI command implementations
//!
//! Start commands capture the environment once, hand it to the
//! orchestrator and return the exit code the container should report.

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process;

use serde_json::json;

use crate::config::capture_environment;
use crate::orchestrator::Orchestrator;
use crate::replication::ReplicationRole;
use crate::supervisor::{shutdown_channel, spawn_signal_listener};

use super::args::{Command, StartArgs};
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Dispatch a parsed command
pub fn run_command(args: &StartArgs, command: &Command) -> CliResult<i32> {
    match command {
        Command::Client { args: client_args } => client(args, client_args),
        Command::Config { role } => config(args, (*role).into()),
        Command::Run => start(args, ReplicationRole::None),
        Command::Master => start(args, ReplicationRole::Master),
        Command::Slave => start(args, ReplicationRole::Slave),
    }
}

/// Orchestrate a start in `role` and supervise the daemon
pub fn start(args: &StartArgs, role: ReplicationRole) -> CliResult<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let orchestrator = Orchestrator::new(args.options(), capture_environment());
    runtime.block_on(supervise(orchestrator, role))
}

async fn supervise(orchestrator: Orchestrator, role: ReplicationRole) -> CliResult<i32> {
    let (trigger, signal) = shutdown_channel();
    spawn_signal_listener(trigger).map_err(|e| CliError::Runtime(e.to_string()))?;
    let code = orchestrator.run(role, signal).await?;
    Ok(code)
}

/// Validate and print the resolved configuration
pub fn config(args: &StartArgs, role: ReplicationRole) -> CliResult<i32> {
    let orchestrator = Orchestrator::new(args.options(), capture_environment());
    let start = orchestrator.resolve(role)?;
    let document = start.configuration.render();

    write_response(json!({
        "role": start.role.as_str(),
        "master": start.replication.as_ref().and_then(|link| link.master_address.clone()),
        "configuration": start.configuration,
        "document": document,
    }))?;
    Ok(0)
}

/// Replace this process with the client connected as local root
pub fn client(args: &StartArgs, client_args: &[String]) -> CliResult<i32> {
    let err = process::Command::new(&args.client_binary)
        .args(client_command_args(&args.daemon_socket, client_args))
        .exec();
    Err(CliError::ClientExec {
        binary: args.client_binary.display().to_string(),
        reason: err.to_string(),
    })
}

fn client_command_args(socket: &Path, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        format!("--socket={}", socket.display()),
        "-u".to_string(),
        "root".to_string(),
    ];
    args.extend(extra.iter().cloned());
    args
}
