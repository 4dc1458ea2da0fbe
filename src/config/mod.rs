//! Configuration module for gsmaterial
//!
//! Provides types and parsing for `gsmaterial.toml` plus environment and CLI
//! overrides.

pub mod loader;
pub mod schema;

pub use loader::{resolve_config, CliOverrides, ConfigError};
pub use schema::*;
