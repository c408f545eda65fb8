//! Loading of the optional YAML configuration file.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::config::ConfabConfig;

/// Read and parse the file given via `--config`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub fn load_config_file(path: &Path) -> Result<ConfabConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ConfabConfig::default());
    }
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}
