//! Domain layer: pure types, validation, and planning.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod keyring;
pub mod membership;
pub mod params;
pub mod process;

pub use config::ConfabConfig;
pub use error::{ConfigError, ConfigStep, ControllerError};
pub use keyring::{KeyringPlan, plan_keyring, replacement_primary, validate_encryption_key};
pub use membership::{Member, alive_addresses, missing_members};
pub use params::{BootParameters, NodeRole, RetryPolicy};
pub use process::{AgentProcessHandle, BootPhase};
