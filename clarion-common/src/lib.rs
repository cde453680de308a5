//! # Clarion Common Library
//!
//! Shared code for the Clarion media enhancement service:
//! - Common error type
//! - Configuration loading (TOML file + environment overrides)

pub mod config;
pub mod error;

pub use config::TomlConfig;
pub use error::{Error, Result};
