//! The `device-router` process.
//!
//! Provides:
//! - TOML configuration with validation
//! - Logging setup
//! - The redirect and health listeners, wired to a membership subscription
//! - Offline `lookup` and `inspect` commands

pub mod commands;
pub mod config;
pub mod error;
pub mod health;
pub mod server;
pub mod telemetry;

pub use config::RouterConfig;
pub use error::Failure;
