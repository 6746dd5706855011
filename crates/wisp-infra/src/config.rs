//! Configuration loader for Wisp.
//!
//! Reads `config.toml` from the data directory (`~/.wisp/` in production)
//! and deserializes it into [`WispConfig`]. Falls back to the stock model
//! table when the file is missing, malformed, or fails validation.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use wisp_types::config::{BackendConfig, WispConfig};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "WISP_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `WISP_DATA_DIR` environment variable
/// 2. `~/.wisp`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".wisp");
    }

    PathBuf::from(".wisp")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`WispConfig::default()`].
/// - A fallback backend that is not defined: a warning is logged and the
///   fallback is disabled; the rest of the file is kept.
/// - Unreadable, unparsable, or otherwise invalid file: a warning is logged
///   and the default is returned.
pub async fn load_config(data_dir: &Path) -> WispConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return WispConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return WispConfig::default();
        }
    };

    let mut config = match toml::from_str::<WispConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            return WispConfig::default();
        }
    };

    if let Some(fallback) = config.drop_unknown_fallback() {
        tracing::warn!(
            "Fallback backend '{fallback}' in {} is not defined, disabling the fallback",
            config_path.display()
        );
    }

    if let Err(err) = config.validate() {
        tracing::warn!("Invalid {}: {err}, using defaults", config_path.display());
        return WispConfig::default();
    }

    config
}

/// Resolve the API key for one backend.
///
/// Priority:
/// 1. Explicit override (`--api-key`)
/// 2. The backend's own `api_key_env` variable
/// 3. The global `api_key_env` variable
///
/// Empty values count as absent.
pub fn resolve_api_key(
    config: &WispConfig,
    backend: &BackendConfig,
    override_key: Option<&str>,
) -> Option<SecretString> {
    if let Some(key) = override_key.filter(|k| !k.trim().is_empty()) {
        return Some(SecretString::from(key.trim().to_string()));
    }

    let var = backend.api_key_env.as_deref().unwrap_or(&config.api_key_env);
    match std::env::var(var) {
        Ok(val) if !val.trim().is_empty() => Some(SecretString::from(val.trim().to_string())),
        _ => None,
    }
}
