//! Boot controller: start the agent, wait for the cluster to form, push
//! server configuration, and the inverse stop path.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::collections::BTreeSet;
use std::future::Future;

use anyhow::Context;

use crate::application::ports::{AgentClient, AgentRunner, Clock};
use crate::application::services::retry::RetryBudget;
use crate::domain::error::{ConfigStep, ControllerError};
use crate::domain::keyring::{plan_keyring, replacement_primary};
use crate::domain::membership::missing_members;
use crate::domain::params::{BootParameters, NodeRole};
use crate::domain::process::BootPhase;

/// Proof that `boot_agent` observed every expected member.
///
/// Only `boot_agent` can construct one, so `configure_server` cannot run
/// against an agent that has not joined.
#[derive(Debug)]
pub struct JoinedCluster {
    members: BTreeSet<String>,
    attempts: u32,
}

impl JoinedCluster {
    /// Members observed on the successful poll.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Polls it took to observe the full expected set.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Supervises one agent: exposes exactly boot, configure and stop.
pub struct BootController<'a, R, A, C> {
    runner: &'a R,
    client: &'a A,
    clock: &'a C,
    params: BootParameters,
}

impl<'a, R, A, C> BootController<'a, R, A, C>
where
    R: AgentRunner,
    A: AgentClient,
    C: Clock,
{
    /// Wire the collaborators together.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if `params` fail validation (notably an
    /// empty expected member set).
    pub fn new(
        runner: &'a R,
        client: &'a A,
        clock: &'a C,
        params: BootParameters,
    ) -> Result<Self, ControllerError> {
        params.validate()?;
        Ok(Self {
            runner,
            client,
            clock,
            params,
        })
    }

    #[must_use]
    pub fn params(&self) -> &BootParameters {
        &self.params
    }

    /// Start the agent if needed, then poll membership until every expected
    /// member is present or the retry budget runs out.
    ///
    /// # Errors
    ///
    /// - `ProcessStartFailure` if the agent cannot be launched (no polling).
    /// - `ClusterMembershipTimeout` if the budget is exhausted; carries the
    ///   members missing from the final attempt.
    pub async fn boot_agent(&self) -> Result<JoinedCluster, ControllerError> {
        let started_at = self.clock.now();
        enter(BootPhase::Idle);
        self.ensure_running().await?;

        enter(BootPhase::Polling);
        let expected = &self.params.expected_members;
        let mut budget = RetryBudget::new(self.params.retry, self.clock);
        // Last successful snapshot wins; all expected until one succeeds.
        let mut missing: Vec<String> = expected.iter().cloned().collect();
        let mut last_error = None;
        tracing::debug!(
            max_attempts = self.params.retry.max_attempts(),
            delay_ms = self.params.retry.delay.as_millis(),
            "polling membership"
        );

        while budget.next_attempt().await {
            let attempt = budget.attempts_made();
            match self.client.current_members().await {
                Ok(observed) => {
                    missing = missing_members(expected, &observed);
                    last_error = None;
                    if missing.is_empty() {
                        enter(BootPhase::Joined);
                        tracing::info!(
                            attempts = attempt,
                            elapsed_ms = elapsed_ms(self.clock, started_at),
                            members = observed.len(),
                            "cluster joined",
                        );
                        return Ok(JoinedCluster {
                            members: observed,
                            attempts: attempt,
                        });
                    }
                    if !budget.is_last() {
                        tracing::info!(attempt, missing = ?missing, "waiting for expected members");
                    }
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    tracing::warn!(attempt, error = %reason, "membership query failed");
                    last_error = Some(reason);
                }
            }
        }

        enter(BootPhase::TimedOut);
        Err(ControllerError::ClusterMembershipTimeout {
            missing,
            attempts: budget.attempts_made(),
            last_error,
        })
    }

    /// Push encryption keys and the transport-security mode into the live
    /// cluster.
    ///
    /// Sub-steps run in order (install keys, prune keys, transport security),
    /// each with its own retry budget. The first sub-step to exhaust its
    /// budget aborts the rest; earlier sub-steps are not rolled back.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` if this node is not a server.
    /// - `ServerConfigurationFailure` naming the failed sub-step.
    pub async fn configure_server(&self, joined: &JoinedCluster) -> Result<(), ControllerError> {
        if self.params.role != NodeRole::Server {
            return Err(ControllerError::InvalidParameters(format!(
                "server configuration requested for a {} node",
                self.params.role
            )));
        }

        enter(BootPhase::Configuring);
        tracing::debug!(members = joined.members().len(), "configuring server");
        match self.apply_configuration().await {
            Ok(()) => {
                enter(BootPhase::Configured);
                Ok(())
            }
            Err(e) => {
                enter(BootPhase::ConfigFailed);
                Err(e)
            }
        }
    }

    /// Signal the recorded agent to terminate. Servers leave the cluster
    /// first so peers see the departure before the process exits.
    ///
    /// # Errors
    ///
    /// - `NoRunningAgent` if there is no readable pid file (nothing is signalled).
    /// - `ProcessStopFailure` if the signal cannot be delivered.
    pub async fn stop_agent(&self) -> Result<(), ControllerError> {
        let handle = match self.runner.recorded() {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                return Err(ControllerError::NoRunningAgent {
                    reason: "no pid file found".to_string(),
                });
            }
            Err(e) => {
                return Err(ControllerError::NoRunningAgent {
                    reason: format!("{e:#}"),
                });
            }
        };

        if self.params.role == NodeRole::Server {
            match self.client.leave().await {
                Ok(()) => tracing::info!("left the cluster"),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "graceful leave failed, stopping anyway");
                }
            }
        }

        self.runner
            .stop(&handle)
            .await
            .map_err(|e| ControllerError::ProcessStopFailure {
                pid: handle.pid,
                reason: format!("{e:#}"),
            })?;
        tracing::info!(%handle, "agent signalled to stop");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────────────

    async fn ensure_running(&self) -> Result<(), ControllerError> {
        match self.runner.recorded() {
            Ok(Some(handle)) if self.runner.is_alive(&handle) => {
                tracing::info!(%handle, "agent already running");
                return Ok(());
            }
            Ok(Some(handle)) => tracing::debug!(%handle, "recorded agent is gone"),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable pid file"),
        }

        enter(BootPhase::Starting);
        let handle = self
            .runner
            .start(&self.params.config_dir)
            .await
            .map_err(|e| ControllerError::ProcessStartFailure {
                reason: format!("{e:#}"),
            })?;
        tracing::info!(%handle, "agent started");
        Ok(())
    }

    async fn apply_configuration(&self) -> Result<(), ControllerError> {
        if self.params.encryption_keys.is_empty() {
            tracing::info!("no encryption keys configured, skipping key rotation");
        } else {
            self.with_retry(ConfigStep::InstallKeys, move || self.install_keys())
                .await?;
            self.with_retry(ConfigStep::PruneKeys, move || self.prune_keys())
                .await?;
        }

        let enabled = !self.params.transport_security_disabled;
        let client = self.client;
        self.with_retry(ConfigStep::TransportSecurity, move || {
            client.set_transport_security(enabled)
        })
        .await?;
        tracing::info!(transport_security = enabled, "server configured");
        Ok(())
    }

    async fn install_keys(&self) -> anyhow::Result<()> {
        let active = self
            .client
            .list_encryption_keys()
            .await
            .context("listing encryption keys")?;
        let plan = plan_keyring(&self.params.encryption_keys, &active);
        for key in &plan.install {
            self.client
                .set_encryption_key(key)
                .await
                .context("installing encryption key")?;
        }
        tracing::debug!(installed = plan.install.len(), "encryption keys installed");
        Ok(())
    }

    async fn prune_keys(&self) -> anyhow::Result<()> {
        let active = self
            .client
            .list_encryption_keys()
            .await
            .context("listing encryption keys")?;
        let plan = plan_keyring(&self.params.encryption_keys, &active);
        if plan.remove.is_empty() {
            return Ok(());
        }

        // The agent refuses to remove its primary key.
        let primary = self
            .client
            .primary_encryption_keys()
            .await
            .context("listing primary encryption keys")?;
        if let Some(key) = replacement_primary(&self.params.encryption_keys, &primary) {
            self.client
                .use_encryption_key(key)
                .await
                .context("activating encryption key")?;
            tracing::info!("primary encryption key replaced");
        }

        for key in &plan.remove {
            self.client
                .remove_encryption_key(key)
                .await
                .context("removing encryption key")?;
        }
        tracing::debug!(removed = plan.remove.len(), "stale encryption keys removed");
        Ok(())
    }

    async fn with_retry<F, Fut>(&self, step: ConfigStep, mut op: F) -> Result<(), ControllerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let mut budget = RetryBudget::new(self.params.retry, self.clock);
        let mut last_error = None;

        while budget.next_attempt().await {
            match op().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    let reason = format!("{e:#}");
                    tracing::warn!(%step, attempt = budget.attempts_made(), error = %reason, "configuration step failed");
                    last_error = Some(reason);
                }
            }
        }

        Err(ControllerError::ServerConfigurationFailure {
            step,
            attempts: budget.attempts_made(),
            reason: last_error.unwrap_or_default(),
        })
    }
}

fn enter(phase: BootPhase) {
    tracing::debug!(%phase, "controller phase");
}

fn elapsed_ms(clock: &impl Clock, since: std::time::Instant) -> u128 {
    clock.now().saturating_duration_since(since).as_millis()
}
