//! Boot parameters: node role, retry policy, and the immutable value handed
//! to the boot controller.
//!
//! Pure types and validation only.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::error::ControllerError;
use crate::domain::keyring::validate_encryption_key;

// ── Constants ────────────────────────────────────────────────────────────────

/// Additional polling attempts after the first one.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Fixed wait between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

// ── Node role ────────────────────────────────────────────────────────────────

/// Role of this node in the cluster.
///
/// Selects which controller operations run: clients only boot, servers boot
/// and then push runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Client,
    Server,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Client => "client",
            Self::Server => "server",
        })
    }
}

// ── Retry policy ─────────────────────────────────────────────────────────────

/// Fixed-delay retry policy shared by membership polling and every
/// configuration sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    /// Wait before each attempt except the first.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Total number of attempts the policy allows.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

// ── Boot parameters ──────────────────────────────────────────────────────────

/// Everything one controller invocation needs, fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct BootParameters {
    pub role: NodeRole,
    /// Directory handed to the agent on start.
    pub config_dir: PathBuf,
    /// Addresses that must all be visible before boot succeeds.
    pub expected_members: BTreeSet<String>,
    pub retry: RetryPolicy,
    /// Gossip encryption keys, in configured order. Empty means no rotation.
    pub encryption_keys: Vec<String>,
    pub transport_security_disabled: bool,
}

impl BootParameters {
    /// Reject parameters the controller cannot act on.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if the expected member set is empty, a
    /// member address is blank, or an encryption key is malformed.
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.expected_members.is_empty() {
            return Err(ControllerError::InvalidParameters(
                "expected member set is empty".to_string(),
            ));
        }
        if self.expected_members.iter().any(|m| m.trim().is_empty()) {
            return Err(ControllerError::InvalidParameters(
                "expected member address is blank".to_string(),
            ));
        }
        for key in &self.encryption_keys {
            validate_encryption_key(key).map_err(ControllerError::InvalidParameters)?;
        }
        Ok(())
    }
}
