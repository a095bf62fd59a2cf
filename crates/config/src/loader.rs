use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::BaleflowConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "baleflow.toml",
    "baleflow.yaml",
    "baleflow.yml",
    "baleflow.json",
];

/// Env vars that override values from the config file.
const ENV_TOKEN: &str = "BALEFLOW_TOKEN";
const ENV_API_URL: &str = "BALEFLOW_API_URL";
const ENV_PUBLIC_URL: &str = "BALEFLOW_PUBLIC_URL";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<BaleflowConfig> {
    let raw = read_substituted(path)?;
    parse_config(&raw, path)
}

/// Load any TOML, YAML or JSON file as a JSON value, with env
/// substitution. Used for node parameter and item files.
pub fn load_value(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = read_substituted(path)?;
    parse_value(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./baleflow.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/baleflow/baleflow.{toml,yaml,yml,json}` (user-global)
///
/// Returns `BaleflowConfig::default()` if no config file is found.
pub fn discover_and_load() -> BaleflowConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    BaleflowConfig::default()
}

/// Returns the user-global config directory (`~/.config/baleflow/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "baleflow").map(|d| d.config_dir().to_path_buf())
}

/// Apply `BALEFLOW_*` environment overrides.
pub fn apply_env_overrides(config: BaleflowConfig) -> BaleflowConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: BaleflowConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> BaleflowConfig {
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = lookup(ENV_TOKEN) {
        debug!(var = ENV_TOKEN, "bot token overridden from environment");
        config.credentials.token = Some(Secret::new(token));
    }
    if let Some(url) = lookup(ENV_API_URL) {
        config.credentials.base_api_url = Some(url);
    }
    if let Some(url) = lookup(ENV_PUBLIC_URL) {
        config.server.public_url = Some(url);
    }
    config
}

fn find_config_file() -> Option<PathBuf> {
    find_config_file_in(Path::new("."))
        .or_else(|| config_dir().and_then(|dir| find_config_file_in(&dir)))
}

fn find_config_file_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn read_substituted(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(substitute_env(&raw))
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<BaleflowConfig> {
    match extension(path) {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        ext => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

fn parse_value(raw: &str, path: &Path) -> anyhow::Result<serde_json::Value> {
    match extension(path) {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        ext => anyhow::bail!("unsupported file format: .{ext}"),
    }
}
