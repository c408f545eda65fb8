//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, pid-file
//! access, the management API client, timers, and config-file loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod agent_runner;
pub mod clock;
pub mod config;
pub mod consul_client;
pub mod fs;
