//! Gossip keyring planning and key validation.
//!
//! Pure functions only.

use std::collections::BTreeSet;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Raw key lengths accepted by the agent's gossip keyring (AES-128/192/256).
const VALID_KEY_LENGTHS: &[usize] = &[16, 24, 32];

/// Keyring changes needed to reach the configured key list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyringPlan {
    /// Configured keys not yet active, in configured order.
    pub install: Vec<String>,
    /// Active keys absent from the configured list.
    pub remove: Vec<String>,
}

impl KeyringPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.install.is_empty() && self.remove.is_empty()
    }
}

/// Compute installs and removals to move `active` to `desired`.
///
/// An empty `desired` list means no rotation was requested, so nothing is
/// removed.
#[must_use]
pub fn plan_keyring(desired: &[String], active: &BTreeSet<String>) -> KeyringPlan {
    if desired.is_empty() {
        return KeyringPlan::default();
    }

    let mut seen = BTreeSet::new();
    let install = desired
        .iter()
        .filter(|k| !active.contains(*k) && seen.insert(k.as_str()))
        .cloned()
        .collect();
    let remove = active
        .iter()
        .filter(|k| !desired.contains(k))
        .cloned()
        .collect();

    KeyringPlan { install, remove }
}

/// Key to promote before pruning, if any current primary is being removed.
///
/// Returns the first configured key when some entry of `primary` is not in
/// `desired`, and `None` otherwise, so a retained primary is never touched.
#[must_use]
pub fn replacement_primary<'a>(
    desired: &'a [String],
    primary: &BTreeSet<String>,
) -> Option<&'a String> {
    let first = desired.first()?;
    primary
        .iter()
        .any(|k| !desired.contains(k))
        .then_some(first)
}

/// Check that `key` is base64 for a 16, 24 or 32 byte key.
///
/// # Errors
///
/// Returns a human-readable reason when the key is malformed.
pub fn validate_encryption_key(key: &str) -> Result<(), String> {
    let bytes = STANDARD
        .decode(key)
        .map_err(|e| format!("encryption key is not valid base64: {e}"))?;
    if !VALID_KEY_LENGTHS.contains(&bytes.len()) {
        return Err(format!(
            "encryption key decodes to {} bytes, expected 16, 24 or 32",
            bytes.len()
        ));
    }
    Ok(())
}
