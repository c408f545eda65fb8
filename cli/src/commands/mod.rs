//! Command implementations and the option resolution they share.

pub mod start;
pub mod stop;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::domain::config::ConfabConfig;
use crate::domain::error::ConfigError;
use crate::domain::params::{
    BootParameters, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, NodeRole, RetryPolicy,
};
use crate::infra::agent_runner::ProcessAgentRunner;
use crate::infra::consul_client::{DEFAULT_API_ADDRESS, DEFAULT_KV_PREFIX, HttpAgentClient};
use crate::infra::fs::resolve_executable;

/// Command-line spelling of [`NodeRole`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    Client,
    Server,
}

impl From<RoleArg> for NodeRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Client => Self::Client,
            RoleArg::Server => Self::Server,
        }
    }
}

/// Options shared by `start` and `stop`.
#[derive(Args, Debug, Default, Clone)]
pub struct AgentArgs {
    /// Node role
    #[arg(long, value_enum, env = "CONFAB_NODE_TYPE")]
    pub node_type: Option<RoleArg>,

    /// Path to the on-filesystem consul executable
    #[arg(long, value_name = "EXECUTABLE", env = "CONFAB_AGENT_PATH")]
    pub agent_path: Option<String>,

    /// Path to consul configuration directory
    #[arg(long, value_name = "DIRECTORY", env = "CONFAB_CONSUL_CONFIG_DIR")]
    pub consul_config_dir: Option<String>,

    /// Path to consul PID file
    #[arg(long, value_name = "FILE", env = "CONFAB_PID_FILE")]
    pub pid_file: Option<String>,

    /// Address of an expected member (repeatable)
    #[arg(long = "expected-member", value_name = "ADDRESS")]
    pub expected_members: Vec<String>,

    /// Key used to encrypt consul traffic (repeatable)
    #[arg(long = "encryption-key", value_name = "KEY")]
    pub encryption_keys: Vec<String>,

    /// Disable transport security; `--ssl-disabled=false` overrides the file
    #[arg(
        long,
        value_name = "BOOL",
        env = "CONFAB_SSL_DISABLED",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub ssl_disabled: Option<bool>,

    /// Polling attempts after the first one [default: 10]
    #[arg(long, env = "CONFAB_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Wait between attempts, in milliseconds [default: 1000]
    #[arg(long, value_name = "MS", env = "CONFAB_RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,

    /// Management API address [default: http://127.0.0.1:8500]
    #[arg(long, value_name = "URL", env = "CONFAB_API_ADDRESS")]
    pub api_address: Option<String>,

    /// Management API ACL token
    #[arg(long, value_name = "TOKEN", env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// KV prefix for settings recorded by confab [default: confab]
    #[arg(long, value_name = "PREFIX", env = "CONFAB_KV_PREFIX")]
    pub kv_prefix: Option<String>,
}

/// Fully resolved options for one command.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub params: BootParameters,
    pub agent_path: PathBuf,
    pub pid_file: PathBuf,
    pub api_address: String,
    pub api_token: Option<String>,
    pub kv_prefix: String,
}

impl Invocation {
    /// Agent runner for this invocation's executable and pid file.
    #[must_use]
    pub fn agent_runner(&self) -> ProcessAgentRunner {
        ProcessAgentRunner::new(self.agent_path.clone(), self.pid_file.clone())
    }

    /// Management API client for this invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn agent_client(&self) -> Result<HttpAgentClient> {
        HttpAgentClient::new(&self.api_address, self.api_token.clone(), &self.kv_prefix)
    }
}

impl AgentArgs {
    /// Merge flags over the config file and validate the result.
    ///
    /// Flags and environment variables win over the file; list options given
    /// on the command line replace the file's lists.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid option.
    pub fn resolve(self, file: ConfabConfig) -> Result<Invocation> {
        let role = self
            .node_type
            .map(NodeRole::from)
            .or(file.node_type)
            .ok_or(ConfigError::Missing("node-type"))?;

        let agent_path = self
            .agent_path
            .or(file.agent_path)
            .ok_or(ConfigError::Missing("agent-path"))?;
        let agent_path =
            resolve_executable(&agent_path).ok_or(ConfigError::AgentNotFound(agent_path))?;

        let pid_file = self.pid_file.or(file.pid_file).unwrap_or_default();
        if pid_file.trim().is_empty() {
            return Err(ConfigError::EmptyPidFile.into());
        }

        let config_dir = self
            .consul_config_dir
            .or(file.consul_config_dir)
            .unwrap_or_default();
        if config_dir.is_empty() || std::fs::metadata(&config_dir).is_err() {
            return Err(ConfigError::ConfigDirNotFound(config_dir).into());
        }

        let expected_members: BTreeSet<String> =
            prefer_cli(self.expected_members, file.expected_members)
                .into_iter()
                .collect();
        if expected_members.is_empty() {
            return Err(ConfigError::NoExpectedMembers.into());
        }

        let retry = RetryPolicy {
            max_retries: self
                .max_retries
                .or(file.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            delay: self
                .retry_delay_ms
                .or(file.retry_delay_ms)
                .map_or(DEFAULT_RETRY_DELAY, Duration::from_millis),
        };

        Ok(Invocation {
            params: BootParameters {
                role,
                config_dir: PathBuf::from(config_dir),
                expected_members,
                retry,
                encryption_keys: prefer_cli(self.encryption_keys, file.encryption_keys),
                transport_security_disabled: self
                    .ssl_disabled
                    .or(file.ssl_disabled)
                    .unwrap_or(false),
            },
            agent_path,
            pid_file: PathBuf::from(pid_file),
            api_address: self
                .api_address
                .or(file.api_address)
                .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string()),
            api_token: self.api_token.or(file.api_token),
            kv_prefix: self
                .kv_prefix
                .or(file.kv_prefix)
                .unwrap_or_else(|| DEFAULT_KV_PREFIX.to_string()),
        })
    }
}

fn prefer_cli(cli: Vec<String>, file: Vec<String>) -> Vec<String> {
    if cli.is_empty() { file } else { cli }
}
