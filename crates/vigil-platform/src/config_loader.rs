//! Configuration file discovery and loading.
//!
//! Discovery order:
//! 1. An explicit path (the CLI's `--config` flag).
//! 2. The `VIGIL_CONFIG` environment variable.
//! 3. `~/.vigil/config.json`.
//! 4. Nothing found: an empty JSON object, i.e. all defaults.
//!
//! JSON keys are normalized from camelCase to snake_case before the value
//! is deserialized into [`Config`], and environment overrides are applied
//! last.

use std::path::{Path, PathBuf};

use serde_json::Value;
use vigil_types::{Config, VigilError};

use crate::env::Environment;
use crate::fs::FileSystem;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "VIGIL_CONFIG";

/// Find the config file path without reading it.
///
/// The `VIGIL_CONFIG` path is returned whether or not it exists, so a typo
/// there surfaces as a warning at load time instead of silently falling
/// through to the home directory.
pub fn discover_config_path(env: &dyn Environment, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(env_path) = env.get_var(CONFIG_ENV).filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(env_path));
    }

    let candidate = home_dir?.join(".vigil").join("config.json");
    candidate.exists().then_some(candidate)
}

/// Load the raw, key-normalized JSON config.
///
/// An explicit path must exist. A discovered path that does not exist falls
/// back to defaults with a warning.
pub async fn load_config_raw(
    fs: &dyn FileSystem,
    env: &dyn Environment,
    explicit: Option<&Path>,
) -> Result<Value, VigilError> {
    let path = match explicit {
        Some(path) => {
            if !fs.exists(path).await {
                return Err(VigilError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => {
            let Some(path) = discover_config_path(env, fs.home_dir()) else {
                tracing::info!("no config file found, using defaults");
                return Ok(Value::Object(serde_json::Map::new()));
            };
            if !fs.exists(&path).await {
                tracing::warn!(
                    path = %path.display(),
                    "config path does not exist, using defaults"
                );
                return Ok(Value::Object(serde_json::Map::new()));
            }
            path
        }
    };

    tracing::debug!(path = %path.display(), "loading config file");
    let contents = fs.read_to_string(&path).await?;
    let value: Value = serde_json::from_str(&contents).map_err(|e| {
        VigilError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    Ok(normalize_keys(value))
}

/// Load, deserialize and apply environment overrides.
///
/// Does not validate; callers decide when a missing base URL is fatal.
pub async fn load_config(
    fs: &dyn FileSystem,
    env: &dyn Environment,
    explicit: Option<&Path>,
) -> Result<Config, VigilError> {
    let raw = load_config_raw(fs, env, explicit).await?;
    let mut config: Config = serde_json::from_value(raw)?;
    config.apply_env(|name| env.get_var(name));
    Ok(config)
}

/// Convert camelCase keys to snake_case, recursively.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (camel_to_snake(&key), normalize_keys(val)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Convert one camelCase identifier to snake_case.
///
/// ```
/// # use vigil_platform::config_loader::camel_to_snake;
/// assert_eq!(camel_to_snake("pageSize"), "page_size");
/// assert_eq!(camel_to_snake("baseURL"), "base_url");
/// assert_eq!(camel_to_snake("APIKeyEnv"), "api_key_env");
/// assert_eq!(camel_to_snake("max_pages"), "max_pages");
/// ```
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            // word boundary, or the last capital of an acronym ("APIKey")
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}
