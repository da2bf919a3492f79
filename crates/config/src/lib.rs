//! Configuration loading, env substitution and validation.
//!
//! Config file: `quill.toml`, searched in `./` then the user config
//! directory (`~/.config/quill/` on Linux).
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{ConfigError, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config, parse_config},
    schema::{EngineConfig, QuillConfig, StoreConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
