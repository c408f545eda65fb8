//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::domain::process::AgentProcessHandle;

// ── Agent Runner Port ─────────────────────────────────────────────────────────

/// Owns the agent subprocess lifecycle and its pid file.
#[allow(async_fn_in_trait)]
pub trait AgentRunner {
    /// Launch the agent against `config_dir` and record its pid.
    ///
    /// Returns once the process has survived a short startup grace period;
    /// waiting for the cluster to converge is the controller's job. A process
    /// spawned by a failed start is killed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, exits during the
    /// grace period, or the pid file cannot be written.
    async fn start(&self, config_dir: &Path) -> Result<AgentProcessHandle>;

    /// Send a termination signal to the recorded process.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be delivered.
    async fn stop(&self, handle: &AgentProcessHandle) -> Result<()>;

    /// Read the pid file. `Ok(None)` when no pid file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the pid file exists but cannot be read or parsed.
    fn recorded(&self) -> Result<Option<AgentProcessHandle>>;

    /// Whether the process behind `handle` is still alive.
    fn is_alive(&self, handle: &AgentProcessHandle) -> bool;
}

// ── Agent Client Port ─────────────────────────────────────────────────────────

/// Management API of the running agent.
///
/// Key and transport-security operations are idempotent: setting what is
/// already set, or removing what is absent, succeeds without a state change.
#[allow(async_fn_in_trait)]
pub trait AgentClient {
    /// Addresses of members the agent currently reports as alive.
    async fn current_members(&self) -> Result<BTreeSet<String>>;
    /// Gossip keys currently installed in the cluster keyring.
    async fn list_encryption_keys(&self) -> Result<BTreeSet<String>>;
    /// Install a gossip key.
    async fn set_encryption_key(&self, key: &str) -> Result<()>;
    /// Remove a gossip key. The agent rejects removal of its primary key.
    async fn remove_encryption_key(&self, key: &str) -> Result<()>;
    /// Keys currently used as primary for outgoing gossip.
    async fn primary_encryption_keys(&self) -> Result<BTreeSet<String>>;
    /// Make an installed key the primary.
    async fn use_encryption_key(&self, key: &str) -> Result<()>;
    /// Record whether transport security is enabled.
    async fn set_transport_security(&self, enabled: bool) -> Result<()>;
    /// Gracefully leave the cluster.
    async fn leave(&self) -> Result<()>;
}

// ── Time Port ─────────────────────────────────────────────────────────────────

/// Time source for retry waits, injectable so tests never sleep for real.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}
