//! Configuration module for spritecut
//!
//! Provides types and parsing for `spritecut.toml` detection settings.

pub mod loader;
pub mod schema;

pub use loader::{find_config, find_config_from, load_config, parse_config, ConfigError};
pub use schema::*;
