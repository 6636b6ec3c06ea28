//! CLI argument definitions using clap
//!
//! Commands:
//! - mysqld-orchestrator run
//! - mysqld-orchestrator master
//! - mysqld-orchestrator slave
//! - mysqld-orchestrator client [ARGS...]
//! - mysqld-orchestrator config [--role none|master|slave]

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::orchestrator::OrchestratorOptions;
use crate::replication::ReplicationRole;

/// Container entrypoint for a MySQL server
#[derive(Parser, Debug)]
#[command(name = "mysqld-orchestrator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub start: StartArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the server without replication
    Run,

    /// Start the server as a replication master
    Master,

    /// Start the server as a replication slave
    Slave,

    /// Run the client against the local server
    Client {
        /// Arguments passed to the client
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Validate and print the resolved configuration, start nothing
    Config {
        /// Role to resolve for
        #[arg(long, value_enum, default_value_t = RoleArg::None)]
        role: RoleArg,
    },
}

impl Command {
    /// Role of a start command
    pub fn start_role(&self) -> Option<ReplicationRole> {
        match self {
            Command::Run => Some(ReplicationRole::None),
            Command::Master => Some(ReplicationRole::Master),
            Command::Slave => Some(ReplicationRole::Slave),
            Command::Client { .. } | Command::Config { .. } => None,
        }
    }
}

/// Role accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    None,
    Master,
    Slave,
}

impl From<RoleArg> for ReplicationRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::None => ReplicationRole::None,
            RoleArg::Master => ReplicationRole::Master,
            RoleArg::Slave => ReplicationRole::Slave,
        }
    }
}

/// Paths and timeouts shared by every command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StartArgs {
    /// Persistent data directory
    #[arg(long, global = true, env = "MYSQL_DATADIR", default_value = "/var/lib/mysql/data")]
    pub data_dir: PathBuf,

    /// Directory of user `*.cnf` fragments
    #[arg(long, global = true, env = "MYSQL_CONFIG_DIR", default_value = "/opt/app-root/src/mysql-cfg")]
    pub config_dir: PathBuf,

    /// Root of the init hook directories
    #[arg(long, global = true, env = "MYSQL_HOOK_ROOT", default_value = "/opt/app-root/src")]
    pub hook_root: PathBuf,

    /// Where the generated option file is written
    #[arg(long, global = true, env = "MYSQL_GENERATED_CONFIG", default_value = "/tmp/mysqld-orchestrator.cnf")]
    pub generated_config: PathBuf,

    /// Daemon binary
    #[arg(long, global = true, env = "MYSQLD_BINARY", default_value = "/usr/libexec/mysqld")]
    pub daemon_binary: PathBuf,

    /// Client binary
    #[arg(long, global = true, env = "MYSQL_CLIENT_BINARY", default_value = "mysql")]
    pub client_binary: PathBuf,

    /// Socket of the setup-phase daemon
    #[arg(long, global = true, env = "MYSQL_ADMIN_SOCKET", default_value = "/tmp/mysql.sock")]
    pub admin_socket: PathBuf,

    /// Socket of the long-lived daemon
    #[arg(long, global = true, env = "MYSQL_SOCKET", default_value = "/var/lib/mysql/mysql.sock")]
    pub daemon_socket: PathBuf,

    /// cgroup filesystem root
    #[arg(long, global = true, env = "MYSQL_CGROUP_ROOT", default_value = "/sys/fs/cgroup")]
    pub cgroup_root: PathBuf,

    /// Seconds between forwarding a signal and killing the daemon
    #[arg(long, global = true, env = "MYSQL_SHUTDOWN_GRACE", default_value_t = 30)]
    pub grace_secs: u64,

    /// Seconds the setup-phase daemon may take to accept connections
    #[arg(long, global = true, env = "MYSQL_READY_TIMEOUT", default_value_t = 60)]
    pub ready_timeout_secs: u64,
}

impl StartArgs {
    /// Options for the orchestrator
    pub fn options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            data_dir: self.data_dir.clone(),
            config_dir: self.config_dir.clone(),
            hook_root: self.hook_root.clone(),
            generated_config: self.generated_config.clone(),
            daemon_binary: self.daemon_binary.clone(),
            admin_socket: self.admin_socket.clone(),
            daemon_socket: self.daemon_socket.clone(),
            cgroup_root: self.cgroup_root.clone(),
            grace: Duration::from_secs(self.grace_secs),
            ready_timeout: Duration::from_secs(self.ready_timeout_secs),
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_commands_map_to_roles() {
        let cli = Cli::try_parse_from(["mysqld-orchestrator", "slave"]).unwrap();
        assert_eq!(cli.command.start_role(), Some(ReplicationRole::Slave));

        let cli = Cli::try_parse_from(["mysqld-orchestrator", "run"]).unwrap();
        assert_eq!(cli.command.start_role(), Some(ReplicationRole::None));
    }

    #[test]
    fn test_client_takes_trailing_arguments() {
        let cli =
            Cli::try_parse_from(["mysqld-orchestrator", "client", "-e", "SELECT 1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Client {
                args: vec!["-e".to_string(), "SELECT 1".to_string()]
            }
        );
        assert_eq!(cli.command.start_role(), None);
    }

    #[test]
    fn test_config_role_flag() {
        let cli =
            Cli::try_parse_from(["mysqld-orchestrator", "config", "--role", "master"]).unwrap();
        assert_eq!(cli.command, Command::Config { role: RoleArg::Master });
        assert_eq!(ReplicationRole::from(RoleArg::Master), ReplicationRole::Master);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "mysqld-orchestrator",
            "run",
            "--grace-secs",
            "5",
            "--generated-config",
            "/tmp/other.cnf",
        ])
        .unwrap();
        let options = cli.start.options();
        assert_eq!(options.grace, Duration::from_secs(5));
        assert_eq!(options.generated_config, PathBuf::from("/tmp/other.cnf"));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["mysqld-orchestrator", "replicate"]).is_err());
    }
}
