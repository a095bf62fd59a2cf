//! Configuration loading and env substitution for the baleflow host.
//!
//! Config files: `baleflow.toml`, `baleflow.yaml`, `baleflow.yml` or
//! `baleflow.json`, searched in `./` then the user config dir
//! (`~/.config/baleflow/` on Linux).
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config, load_value},
    schema::{BaleflowConfig, CredentialsConfig, ServerConfig},
};
