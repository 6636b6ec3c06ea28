//! Startup pipeline
//!
//! Strict order, one step at a time:
//!
//! 1. Detect the data directory state
//! 2. Resolve and validate configuration (nothing written before this)
//! 3. Write the configuration document
//! 4. Run pre-init hooks
//! 5. Bootstrap a pristine data directory
//! 6. Start the setup-phase daemon without networking
//! 7. Enforce credentials, outside the binary log when replicating
//! 8. Bootstrap replication, if a role was requested
//! 9. Run init hooks, stop the setup-phase daemon
//! 10. Start and supervise the long-lived daemon
//!
//! A termination signal at any point before step 10 aborts the start.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::{InitializationError, OrchestratorError, OrchestratorResult};
use crate::admin::{AdminError, AdminResult, AdminSession, MysqlAdminSession};
use crate::config::{ConfigResolver, Environment, RawFragment, ResolvedStart};
use crate::credentials::{CredentialEnforcer, CredentialError};
use crate::datadir::{DataDirBootstrapper, InitStateDetector};
use crate::hooks::{HookPhase, HookRunner};
use crate::observability::{log_event_with_fields, Event};
use crate::replication::{ReplicationBootstrapper, ReplicationRole};
use crate::supervisor::{
    DaemonSupervisor, LocalDaemon, ShutdownSignal, SupervisorError, SupervisorResult,
};
use crate::tuning::ResourceBudget;

/// Filesystem locations and timeouts for one start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Persistent data directory
    pub data_dir: PathBuf,
    /// User configuration fragments (`*.cnf`)
    pub config_dir: PathBuf,
    /// Root of `mysql-pre-init` / `mysql-init`
    pub hook_root: PathBuf,
    /// Where the rendered document is written
    pub generated_config: PathBuf,
    /// Daemon binary
    pub daemon_binary: PathBuf,
    /// Socket of the setup-phase daemon
    pub admin_socket: PathBuf,
    /// Socket of the long-lived daemon
    pub daemon_socket: PathBuf,
    /// cgroup filesystem root
    pub cgroup_root: PathBuf,
    /// Wait between forwarding a signal and killing
    pub grace: Duration,
    /// How long the setup-phase daemon may take to accept connections
    pub ready_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/mysql/data"),
            config_dir: PathBuf::from("/opt/app-root/src/mysql-cfg"),
            hook_root: PathBuf::from("/opt/app-root/src"),
            generated_config: PathBuf::from("/tmp/mysqld-orchestrator.cnf"),
            daemon_binary: PathBuf::from("/usr/libexec/mysqld"),
            admin_socket: PathBuf::from("/tmp/mysql.sock"),
            daemon_socket: PathBuf::from("/var/lib/mysql/mysql.sock"),
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
            grace: Duration::from_secs(30),
            ready_timeout: Duration::from_secs(60),
        }
    }
}

/// Runs the startup pipeline for one container start
pub struct Orchestrator {
    options: OrchestratorOptions,
    env: Environment,
}

impl Orchestrator {
    /// Orchestrator over an environment snapshot
    pub fn new(options: OrchestratorOptions, env: Environment) -> Self {
        Self { options, env }
    }

    /// Options in effect
    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Validate and resolve configuration without side effects
    pub fn resolve(&self, role: ReplicationRole) -> OrchestratorResult<ResolvedStart> {
        let budget = ResourceBudget::detect(&self.options.cgroup_root);
        let limit = budget
            .memory_limit()
            .map(|bytes| bytes.to_string())
            .unwrap_or_else(|| "none".to_string());
        log_event_with_fields(Event::MemoryLimitDetected, &[("bytes", limit.as_str())]);

        let fragments = RawFragment::load_dir(&self.options.config_dir)?;
        let start = ConfigResolver::new(
            &self.env,
            &self.options.data_dir,
            &self.options.daemon_socket,
        )
        .with_memory_limit(budget.memory_limit())
        .resolve(role, &fragments)?;
        Ok(start)
    }

    /// Everything before the long-lived daemon. Blocking.
    pub fn prepare(
        &self,
        role: ReplicationRole,
        shutdown: &ShutdownSignal,
    ) -> OrchestratorResult<ResolvedStart> {
        let opts = &self.options;
        self.prepare_with(
            role,
            shutdown,
            || {
                LocalDaemon::start(
                    &opts.daemon_binary,
                    &opts.generated_config,
                    &opts.admin_socket,
                    opts.grace,
                )
            },
            MysqlAdminSession::connect,
        )
    }

    /// [`Orchestrator::prepare`] with the setup-phase daemon launched by
    /// `launch` and reached through `connect`
    fn prepare_with<S, L, C>(
        &self,
        role: ReplicationRole,
        shutdown: &ShutdownSignal,
        launch: L,
        connect: C,
    ) -> OrchestratorResult<ResolvedStart>
    where
        S: AdminSession,
        L: FnOnce() -> SupervisorResult<LocalDaemon>,
        C: FnMut(&Path) -> AdminResult<S>,
    {
        let opts = &self.options;
        log_event_with_fields(Event::OrchestrationStart, &[("role", role.as_str())]);

        let state = InitStateDetector::detect(&opts.data_dir)?;
        let start = self.resolve(role)?;

        start
            .configuration
            .write_to(&opts.generated_config)
            .map_err(|e| InitializationError::ConfigWrite {
                path: opts.generated_config.display().to_string(),
                reason: e.to_string(),
            })?;
        let written = opts.generated_config.display().to_string();
        log_event_with_fields(Event::ConfigWritten, &[("path", written.as_str())]);
        check_shutdown(shutdown)?;

        let hooks = HookRunner::new(&opts.hook_root);
        hooks.run(HookPhase::PreInit, &[])?;

        if state.needs_bootstrap() {
            DataDirBootstrapper::new(&opts.daemon_binary, &opts.generated_config)
                .bootstrap(&opts.data_dir)?;
        }
        check_shutdown(shutdown)?;

        let mut local = launch()?;
        let mut session = local
            .wait_ready_with(opts.ready_timeout, shutdown, connect)
            .map_err(|e| self.unreachable(e))?;

        // account statements of a replicating server stay out of its binlog
        let mut enforcer = CredentialEnforcer::new(&start.credentials);
        if start.replication.is_some() {
            enforcer = enforcer.without_binlog();
        }
        enforcer.enforce(&mut session)?;
        check_shutdown(shutdown)?;

        if let Some(link) = &start.replication {
            ReplicationBootstrapper::new(link, shutdown.clone()).run(&mut session)?;
        }

        let admin_socket = opts.admin_socket.display().to_string();
        hooks.run(HookPhase::Init, &[("MYSQL_ADMIN_SOCKET", admin_socket)])?;

        local.stop(session)?;
        check_shutdown(shutdown)?;
        Ok(start)
    }

    /// Setup-phase daemon never became reachable
    fn unreachable(&self, err: SupervisorError) -> OrchestratorError {
        match err {
            SupervisorError::NotReady { .. } | SupervisorError::ExitedEarly { .. } => {
                CredentialError::Unreachable(AdminError::Connect {
                    target: self.options.admin_socket.display().to_string(),
                    reason: err.to_string(),
                })
                .into()
            }
            other => other.into(),
        }
    }

    /// Prepare, then supervise the daemon. Returns the container exit code.
    pub async fn run(
        self,
        role: ReplicationRole,
        shutdown: ShutdownSignal,
    ) -> OrchestratorResult<i32> {
        let setup_signal = shutdown.clone();
        let (orchestrator, prepared) = tokio::task::spawn_blocking(move || {
            let prepared = self.prepare(role, &setup_signal);
            (self, prepared)
        })
        .await
        .map_err(|e| SupervisorError::Io {
            context: "setup task",
            reason: e.to_string(),
        })?;
        prepared?;
        check_shutdown(&shutdown)?;

        let opts = &orchestrator.options;
        let code = DaemonSupervisor::for_daemon(&opts.daemon_binary, &opts.generated_config)
            .with_grace(opts.grace)
            .run(shutdown)
            .await?;
        Ok(code)
    }
}

fn check_shutdown(shutdown: &ShutdownSignal) -> OrchestratorResult<()> {
    match shutdown.received() {
        Some(signal) => Err(OrchestratorError::Interrupted { signal }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::fake::FakeSession;
    use crate::admin::ReplicaStatus;
    use crate::config::Provenance;
    use crate::supervisor::shutdown_channel;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn options(root: &TempDir) -> OrchestratorOptions {
        OrchestratorOptions {
            data_dir: root.path().join("data"),
            config_dir: root.path().join("cfg"),
            hook_root: root.path().join("hooks"),
            generated_config: root.path().join("generated.cnf"),
            daemon_binary: PathBuf::from("/nonexistent/mysqld"),
            admin_socket: root.path().join("admin.sock"),
            daemon_socket: root.path().join("mysql.sock"),
            cgroup_root: root.path().join("cgroup"),
            grace: Duration::from_millis(200),
            ready_timeout: Duration::from_millis(200),
        }
    }

    fn env(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_reads_cgroup_and_fragments() {
        let root = TempDir::new().unwrap();
        let opts = options(&root);
        fs::create_dir_all(opts.cgroup_root.clone()).unwrap();
        fs::write(opts.cgroup_root.join("memory.max"), "268435456\n").unwrap();
        fs::create_dir_all(&opts.config_dir).unwrap();
        fs::write(
            opts.config_dir.join("50-custom.cnf"),
            "[mysqld]\nmax_connections = 300\n",
        )
        .unwrap();

        let start = Orchestrator::new(opts, env(&[("MYSQL_MAX_CONNECTIONS", "200")]))
            .resolve(ReplicationRole::None)
            .unwrap();

        let config = &start.configuration;
        assert_eq!(config.value("innodb_buffer_pool_size"), Some("128M"));
        assert_eq!(config.value("max_connections"), Some("300"));
        assert_eq!(
            config.get("max_connections").unwrap().provenance,
            Provenance::UserFile
        );
    }

    #[test]
    fn test_validation_failure_writes_nothing() {
        let root = TempDir::new().unwrap();
        let opts = options(&root);
        let generated = opts.generated_config.clone();
        let (_trigger, signal) = shutdown_channel();

        let err = Orchestrator::new(opts, env(&[("MYSQL_USER", "user"), ("MYSQL_DATABASE", "db")]))
            .prepare(ReplicationRole::None, &signal)
            .unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(!generated.exists());
    }

    #[test]
    fn test_interrupt_before_any_process() {
        let root = TempDir::new().unwrap();
        let opts = options(&root);
        let (trigger, signal) = shutdown_channel();
        trigger.trigger(15);

        let err = Orchestrator::new(opts.clone(), Environment::new())
            .prepare(ReplicationRole::None, &signal)
            .unwrap_err();

        assert_eq!(err.exit_code(), 143);
        assert!(opts.generated_config.exists());
        assert!(!opts.data_dir.exists());
    }

    #[test]
    fn test_failed_pre_init_hook_is_initialization_error() {
        let root = TempDir::new().unwrap();
        let opts = options(&root);
        let hook_dir = opts.hook_root.join("mysql-pre-init");
        fs::create_dir_all(&hook_dir).unwrap();
        fs::write(hook_dir.join("10-fail.sh"), "exit 1\n").unwrap();
        let (_trigger, signal) = shutdown_channel();

        let err = Orchestrator::new(opts, Environment::new())
            .prepare(ReplicationRole::None, &signal)
            .unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.code(), "MYSQLD_HOOK_FAILED");
    }

    #[test]
    fn test_missing_daemon_binary_fails_bootstrap() {
        let root = TempDir::new().unwrap();
        let opts = options(&root);
        let (_trigger, signal) = shutdown_channel();

        let err = Orchestrator::new(opts, Environment::new())
            .prepare(ReplicationRole::None, &signal)
            .unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.code(), "MYSQLD_DATADIR_BOOTSTRAP_SPAWN");
    }

    #[test]
    fn test_setup_daemon_that_never_listens_is_credential_error() {
        let root = TempDir::new().unwrap();
        let mut opts = options(&root);
        fs::create_dir_all(opts.data_dir.join("mysql")).unwrap();
        // rejects the daemon arguments and exits without opening a socket
        opts.daemon_binary = PathBuf::from("sleep");
        let (_trigger, signal) = shutdown_channel();

        let err = Orchestrator::new(opts, Environment::new())
            .prepare(ReplicationRole::None, &signal)
            .unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.code(), "MYSQLD_CREDENTIAL_UNREACHABLE");
    }

    // ========================================================================
    // Setup phase against a scripted session
    // ========================================================================

    const APPLICATION: &[(&str, &str)] = &[
        ("MYSQL_USER", "user"),
        ("MYSQL_PASSWORD", "pass"),
        ("MYSQL_DATABASE", "db"),
    ];

    const ENFORCED: &[&str] = &[
        "CREATE USER 'user'@'%' IDENTIFIED BY 'pass'",
        "CREATE DATABASE IF NOT EXISTS `db`",
        "GRANT ALL ON `db`.* TO 'user'@'%'",
        "DROP USER IF EXISTS 'root'@'%'",
        "FLUSH PRIVILEGES",
    ];

    /// Run the setup phase over an initialized data directory, with a
    /// stand-in daemon process and `session` as its admin connection
    fn prepare_against(
        root: &TempDir,
        role: ReplicationRole,
        extra: &[(&str, &str)],
        session: &Rc<RefCell<FakeSession>>,
    ) -> OrchestratorResult<ResolvedStart> {
        let opts = options(root);
        fs::create_dir_all(opts.data_dir.join("mysql")).unwrap();
        let init_dir = opts.hook_root.join("mysql-init");
        fs::create_dir_all(&init_dir).unwrap();
        fs::write(
            init_dir.join("10-mark.sh"),
            format!(
                "echo \"$MYSQL_ADMIN_SOCKET\" > {}\n",
                root.path().join("init-ran").display()
            ),
        )
        .unwrap();

        let pairs: Vec<(&str, &str)> = APPLICATION.iter().chain(extra).copied().collect();
        let (_trigger, signal) = shutdown_channel();
        let launch_opts = opts.clone();
        Orchestrator::new(opts, env(&pairs)).prepare_with(
            role,
            &signal,
            || {
                LocalDaemon::spawn(
                    Path::new("sh"),
                    &["-c".to_string(), "exec sleep 30".to_string()],
                    &launch_opts.admin_socket,
                    launch_opts.grace,
                )
            },
            |_| Ok(Rc::clone(session)),
        )
    }

    fn init_hook_socket(root: &TempDir) -> String {
        fs::read_to_string(root.path().join("init-ran"))
            .unwrap()
            .trim()
            .to_string()
    }

    #[test]
    fn test_run_role_enforces_with_binlog_untouched() {
        let root = TempDir::new().unwrap();
        let session = Rc::new(RefCell::new(FakeSession::new()));

        let start = prepare_against(&root, ReplicationRole::None, &[], &session).unwrap();

        assert!(start.replication.is_none());
        let mut expected = ENFORCED.to_vec();
        expected.push("SHUTDOWN");
        assert_eq!(session.borrow().statements, expected);
        assert_eq!(
            init_hook_socket(&root),
            root.path().join("admin.sock").display().to_string()
        );
    }

    #[test]
    fn test_master_role_keeps_accounts_out_of_binlog() {
        let root = TempDir::new().unwrap();
        let session = Rc::new(RefCell::new(FakeSession::new()));

        prepare_against(
            &root,
            ReplicationRole::Master,
            &[("MYSQL_MASTER_USER", "repl"), ("MYSQL_MASTER_PASSWORD", "replpass")],
            &session,
        )
        .unwrap();

        let mut expected = vec!["SET SESSION sql_log_bin = 0"];
        expected.extend_from_slice(ENFORCED);
        expected.extend_from_slice(&[
            "SET SESSION sql_log_bin = 1",
            "CREATE USER 'repl'@'%' IDENTIFIED BY 'replpass'",
            "GRANT REPLICATION SLAVE ON *.* TO 'repl'@'%'",
            "FLUSH PRIVILEGES",
            "SHUTDOWN",
        ]);
        assert_eq!(session.borrow().statements, expected);
        assert!(root.path().join("init-ran").exists());
    }

    #[test]
    fn test_slave_role_enforces_locally_then_follows_master() {
        let root = TempDir::new().unwrap();
        let streaming = ReplicaStatus {
            io_running: "Yes".to_string(),
            sql_running: "Yes".to_string(),
            last_io_errno: 0,
            last_io_error: String::new(),
            last_sql_error: String::new(),
        };
        let session = Rc::new(RefCell::new(
            FakeSession::new().with_statuses(vec![Some(streaming)]),
        ));

        prepare_against(
            &root,
            ReplicationRole::Slave,
            &[
                ("MYSQL_MASTER_USER", "repl"),
                ("MYSQL_MASTER_PASSWORD", "replpass"),
                ("MYSQL_MASTER_SERVICE_NAME", "mysql-master"),
            ],
            &session,
        )
        .unwrap();

        let mut expected = vec!["SET SESSION sql_log_bin = 0"];
        expected.extend_from_slice(ENFORCED);
        expected.extend_from_slice(&[
            "SET SESSION sql_log_bin = 1",
            "STOP SLAVE",
            "CHANGE MASTER TO MASTER_HOST='mysql-master', MASTER_USER='repl', \
             MASTER_PASSWORD='replpass', MASTER_AUTO_POSITION=1",
            "START SLAVE",
            "SHUTDOWN",
        ]);
        let session = session.borrow();
        assert_eq!(session.statements, expected);
        assert!(session.executed("CREATE USER 'repl'").is_empty());
    }

    #[test]
    fn test_failed_enforcement_skips_replication_and_init_hooks() {
        let root = TempDir::new().unwrap();
        let session = Rc::new(RefCell::new(FakeSession::new().failing_on("GRANT")));

        let err = prepare_against(
            &root,
            ReplicationRole::Master,
            &[("MYSQL_MASTER_USER", "repl"), ("MYSQL_MASTER_PASSWORD", "replpass")],
            &session,
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert!(session.borrow().executed("CREATE USER 'repl'").is_empty());
        assert!(!root.path().join("init-ran").exists());
    }
}
