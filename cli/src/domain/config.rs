//! Configuration file schema.
//!
//! Pure types only. Loading lives in `crate::infra::config`.

use serde::Deserialize;

use crate::domain::params::NodeRole;

/// Options read from the YAML file passed via `--config`.
///
/// Every field is optional; command-line flags and environment variables
/// take precedence over anything set here.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfabConfig {
    /// `client` or `server`.
    pub node_type: Option<NodeRole>,
    /// Path to the agent executable.
    pub agent_path: Option<String>,
    /// Directory handed to the agent via `-config-dir`.
    pub consul_config_dir: Option<String>,
    /// Where the agent's pid is recorded.
    pub pid_file: Option<String>,
    /// Addresses that must join before boot succeeds.
    pub expected_members: Vec<String>,
    /// Gossip encryption keys (base64).
    pub encryption_keys: Vec<String>,
    /// Disable transport security.
    pub ssl_disabled: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    /// Management API base URL.
    pub api_address: Option<String>,
    /// ACL token for the management API.
    pub api_token: Option<String>,
    /// KV prefix under which runtime settings are recorded.
    pub kv_prefix: Option<String>,
}
