//! Infrastructure implementation of the `AgentClient` port over the Consul
//! HTTP API.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::ports::AgentClient;
use crate::domain::membership::{Member, alive_addresses};

/// Default management API address of a local agent.
pub const DEFAULT_API_ADDRESS: &str = "http://127.0.0.1:8500";

/// Default KV prefix for settings recorded by confab.
pub const DEFAULT_KV_PREFIX: &str = "confab";

/// Per-request timeout; a hung API costs one attempt, not the whole budget.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(5);

const TRANSPORT_SECURITY_KEY: &str = "transport-security";

/// One pool's view of the gossip keyring.
#[derive(Debug, Deserialize)]
struct KeyringResponse {
    #[serde(rename = "WAN", default)]
    wan: bool,
    #[serde(rename = "Keys", default)]
    keys: HashMap<String, u32>,
    #[serde(rename = "PrimaryKeys", default)]
    primary_keys: HashMap<String, u32>,
}

#[derive(Serialize)]
struct KeyringRequest<'a> {
    #[serde(rename = "Key")]
    key: &'a str,
}

/// Production `AgentClient` talking to the local agent's HTTP API.
pub struct HttpAgentClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    kv_prefix: String,
}

impl HttpAgentClient {
    /// Build a client for the agent at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, token: Option<String>, kv_prefix: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_API_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            kv_prefix: kv_prefix.trim_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.header("X-Consul-Token", token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("{what}: request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{what}: HTTP {status}: {}", body.trim());
        }
        Ok(response)
    }

    fn transport_security_path(&self) -> String {
        format!("/v1/kv/{}/{TRANSPORT_SECURITY_KEY}", self.kv_prefix)
    }

    async fn keyring(&self) -> Result<Vec<KeyringResponse>> {
        let response = self
            .send(
                self.request(Method::GET, "/v1/operator/keyring"),
                "listing keyring",
            )
            .await?;
        let pools: Vec<KeyringResponse> = response.json().await.context("parsing keyring")?;
        tracing::debug!(
            pools = pools.len(),
            wan_pools = pools.iter().filter(|p| p.wan).count(),
            "keyring listed"
        );
        Ok(pools)
    }

    async fn read_transport_security(&self) -> Result<Option<String>> {
        let path = self.transport_security_path();
        let response = self
            .request(Method::GET, &path)
            .query(&[("raw", "")])
            .send()
            .await
            .context("reading transport security: request failed")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("reading transport security: HTTP {status}");
        }
        let value = response
            .text()
            .await
            .context("reading transport security: body")?;
        Ok(Some(value.trim().to_string()))
    }
}

impl AgentClient for HttpAgentClient {
    async fn current_members(&self) -> Result<BTreeSet<String>> {
        let response = self
            .send(self.request(Method::GET, "/v1/agent/members"), "listing members")
            .await?;
        let members: Vec<Member> = response
            .json()
            .await
            .context("parsing member list")?;
        tracing::debug!(count = members.len(), "members listed");
        Ok(alive_addresses(&members))
    }

    async fn list_encryption_keys(&self) -> Result<BTreeSet<String>> {
        let pools = self.keyring().await?;
        Ok(pools.into_iter().flat_map(|p| p.keys.into_keys()).collect())
    }

    async fn set_encryption_key(&self, key: &str) -> Result<()> {
        if self.list_encryption_keys().await?.contains(key) {
            return Ok(());
        }
        self.send(
            self.request(Method::POST, "/v1/operator/keyring")
                .json(&KeyringRequest { key }),
            "installing key",
        )
        .await?;
        Ok(())
    }

    async fn remove_encryption_key(&self, key: &str) -> Result<()> {
        if !self.list_encryption_keys().await?.contains(key) {
            return Ok(());
        }
        self.send(
            self.request(Method::DELETE, "/v1/operator/keyring")
                .json(&KeyringRequest { key }),
            "removing key",
        )
        .await?;
        Ok(())
    }

    async fn primary_encryption_keys(&self) -> Result<BTreeSet<String>> {
        let pools = self.keyring().await?;
        Ok(pools
            .into_iter()
            .flat_map(|p| p.primary_keys.into_keys())
            .collect())
    }

    async fn use_encryption_key(&self, key: &str) -> Result<()> {
        let primary = self.primary_encryption_keys().await?;
        if primary.len() == 1 && primary.contains(key) {
            return Ok(());
        }
        self.send(
            self.request(Method::PUT, "/v1/operator/keyring")
                .json(&KeyringRequest { key }),
            "activating key",
        )
        .await?;
        tracing::info!("primary encryption key changed");
        Ok(())
    }

    async fn set_transport_security(&self, enabled: bool) -> Result<()> {
        let desired = if enabled { "enabled" } else { "disabled" };
        if self.read_transport_security().await?.as_deref() == Some(desired) {
            tracing::debug!(mode = desired, "transport security already set");
            return Ok(());
        }
        let path = self.transport_security_path();
        self.send(
            self.request(Method::PUT, &path).body(desired),
            "writing transport security",
        )
        .await?;
        tracing::info!(mode = desired, "transport security updated");
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        self.send(self.request(Method::PUT, "/v1/agent/leave"), "leaving cluster")
            .await?;
        Ok(())
    }
}
