//! Cluster membership snapshots and comparison against the expected set.

use std::collections::BTreeSet;

use serde::Deserialize;

/// Serf status code for a member that is alive.
pub const MEMBER_STATUS_ALIVE: u8 = 1;

/// One entry of the agent's member list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Member {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Addr")]
    pub addr: String,
    #[serde(rename = "Status", default)]
    pub status: u8,
}

impl Member {
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == MEMBER_STATUS_ALIVE
    }
}

/// Addresses of alive members.
#[must_use]
pub fn alive_addresses(members: &[Member]) -> BTreeSet<String> {
    members
        .iter()
        .filter(|m| m.is_alive())
        .map(|m| m.addr.clone())
        .collect()
}

/// Expected members absent from `observed`, in sorted order.
#[must_use]
pub fn missing_members(expected: &BTreeSet<String>, observed: &BTreeSet<String>) -> Vec<String> {
    expected.difference(observed).cloned().collect()
}
