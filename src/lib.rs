//! mysqld-orchestrator - container entrypoint for a MySQL server
//!
//! Turns an environment snapshot into a validated daemon configuration,
//! bootstraps the data directory, reconciles accounts and replication
//! against a setup-phase daemon, then supervises the long-lived daemon.

pub mod admin;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod datadir;
pub mod hooks;
pub mod observability;
pub mod orchestrator;
pub mod replication;
pub mod supervisor;
pub mod tuning;
