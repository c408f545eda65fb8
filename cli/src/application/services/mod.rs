//! Application services.

pub mod controller;
pub mod retry;
