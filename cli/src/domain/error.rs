//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;

use thiserror::Error;

// ── Controller errors ─────────────────────────────────────────────────────────

/// Errors surfaced by the boot controller.
///
/// Transient failures (a single failed membership poll, a single failed
/// configuration push) never appear here directly; they are absorbed by the
/// retry loop and only escalate as `ClusterMembershipTimeout` or
/// `ServerConfigurationFailure` once the budget is spent.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("invalid boot parameters: {0}")]
    InvalidParameters(String),

    #[error("failed to start agent: {reason}")]
    ProcessStartFailure { reason: String },

    #[error(
        "cluster membership timeout after {attempts} attempt(s); missing members: {}{}",
        .missing.join(", "),
        last_error_suffix(.last_error.as_deref())
    )]
    ClusterMembershipTimeout {
        missing: Vec<String>,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("server configuration failed at '{step}' after {attempts} attempt(s): {reason}")]
    ServerConfigurationFailure {
        step: ConfigStep,
        attempts: u32,
        reason: String,
    },

    #[error("no running agent: {reason}")]
    NoRunningAgent { reason: String },

    #[error("failed to stop agent (pid {pid}): {reason}")]
    ProcessStopFailure { pid: u32, reason: String },
}

fn last_error_suffix(last_error: Option<&str>) -> String {
    last_error
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

// ── Configuration sub-steps ───────────────────────────────────────────────────

/// The independently retried sub-steps of server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStep {
    InstallKeys,
    PruneKeys,
    TransportSecurity,
}

impl fmt::Display for ConfigStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InstallKeys => "install encryption keys",
            Self::PruneKeys => "prune encryption keys",
            Self::TransportSecurity => "set transport security",
        })
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while resolving invocation options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("\"{0}\" must be provided")]
    Missing(&'static str),

    #[error("\"agent-path\" {0:?} cannot be found")]
    AgentNotFound(String),

    #[error("\"pid-file\" cannot be empty")]
    EmptyPidFile,

    #[error("\"consul-config-dir\" {0:?} could not be found")]
    ConfigDirNotFound(String),

    #[error("at least one \"expected-member\" must be provided")]
    NoExpectedMembers,
}
