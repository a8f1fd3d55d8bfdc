//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with [`Settings::default`].
//! 2. Merge a TOML or JSON document over the defaults.
//! 3. Apply `WAYFINDER_*` environment variable overrides.
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `WAYFINDER_PRODUCTION_MODE` | `production_mode` |
//! | `WAYFINDER_MAX_REDIRECTS` | `max_redirects` |
//! | `WAYFINDER_TOGGLE_TRAILING_SLASH` | `toggle_trailing_slash` |
//! | `WAYFINDER_LOG_LEVEL` | `log_level` |
//! | `WAYFINDER_LOG_JSON` | `log_json` |
//!
//! ```rust,no_run
//! use wayfinder_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/router.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::{WayfinderError, WayfinderResult};
use crate::settings::Settings;

/// Prefix shared by every recognised environment variable.
pub const ENV_PREFIX: &str = "WAYFINDER_";

/// Loads settings from a TOML string, keeping defaults for absent keys.
pub fn from_toml_str(toml_str: &str) -> WayfinderResult<Settings> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| WayfinderError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> WayfinderResult<Settings> {
    from_toml_str(&read_source(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> WayfinderResult<Settings> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Loads settings from a JSON string, keeping defaults for absent keys.
pub fn from_json_str(json_str: &str) -> WayfinderResult<Settings> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| WayfinderError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> WayfinderResult<Settings> {
    from_json_str(&read_source(path.as_ref(), "JSON")?)
}

/// Loads settings from environment variables only, starting from defaults.
pub fn from_env() -> WayfinderResult<Settings> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Applies `WAYFINDER_*` overrides from the process environment.
pub fn apply_env_overrides(settings: &mut Settings) -> WayfinderResult<()> {
    apply_overrides(settings, |name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())
}

/// Applies overrides read through `lookup`, keyed by the name after the prefix.
///
/// Booleans accept "true"/"1"/"yes" (case-insensitive) as true and anything
/// else as false. An unparsable `MAX_REDIRECTS` is rejected.
pub fn apply_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> WayfinderResult<()> {
    if let Some(val) = lookup("PRODUCTION_MODE") {
        settings.production_mode = parse_flag(&val);
    }

    if let Some(val) = lookup("MAX_REDIRECTS") {
        settings.max_redirects = val.trim().parse().map_err(|e| {
            WayfinderError::ConfigurationError(format!(
                "{ENV_PREFIX}MAX_REDIRECTS must be a non-negative integer, got '{val}': {e}"
            ))
        })?;
    }

    if let Some(val) = lookup("TOGGLE_TRAILING_SLASH") {
        settings.toggle_trailing_slash = parse_flag(&val);
    }

    if let Some(val) = lookup("LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("LOG_JSON") {
        settings.log_json = parse_flag(&val);
    }

    Ok(())
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_source(path: &Path, format: &str) -> WayfinderResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        WayfinderError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> WayfinderResult<Settings> {
    let defaults = serde_json::to_value(Settings::default()).map_err(|e| {
        WayfinderError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;
    serde_json::from_value(merge_json(defaults, value)).map_err(|e| {
        WayfinderError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table.into_iter().map(|(k, v)| (k, toml_to_json(v))).collect(),
        ),
    }
}

/// Deep-merges two JSON values. `overlay` takes precedence.
fn merge_json(base: serde_json::Value, overlay: serde_json::Value) -> serde_json::Value {
    match (base, overlay) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_json(base_value, value),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}
