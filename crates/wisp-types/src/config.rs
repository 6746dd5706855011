//! Global configuration types for Wisp.
//!
//! `WispConfig` represents the top-level `config.toml` that controls which
//! backends exist, which model routes to which backend, and how failures
//! are reported. All fields have defaults matching the stock model list.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Message substituted for the assistant entry when a submission fails.
pub const DEFAULT_ERROR_MESSAGE: &str = "抱歉，出现了一些错误。";

/// Environment variable consulted for the API key unless overridden.
pub const DEFAULT_API_KEY_ENV: &str = "WISP_API_KEY";

/// Top-level configuration.
///
/// Loaded from `~/.wisp/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WispConfig {
    /// Model selected when a session starts.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Fixed assistant message shown when a submission fails.
    #[serde(default = "default_error_message")]
    pub error_message: String,

    /// Connect timeout; also the whole-request deadline for non-streaming calls.
    /// Streams are bounded by `stream_idle_timeout_secs` instead.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum silence between two stream events before the stream is failed.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,

    /// Backend used for models that have no explicit route.
    ///
    /// An empty string in the file means no fallback.
    #[serde(default = "default_fallback_backend", deserialize_with = "empty_as_none")]
    pub fallback_backend: Option<String>,

    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,

    #[serde(default = "default_models")]
    pub models: Vec<ModelRoute>,
}

/// One OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name referenced by [`ModelRoute::backend`].
    pub name: String,
    /// Base address; `/chat/completions` is appended to it.
    pub base_url: String,
    /// Per-backend override of [`WispConfig::api_key_env`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Maps a model identifier to the backend that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRoute {
    /// Model identifier sent in the request body.
    pub id: String,
    /// Human-readable name for pickers.
    #[serde(default)]
    pub label: String,
    /// Name of the backend in [`WispConfig::backends`].
    pub backend: String,
    /// Whether the model emits `<think>` / `</think>` inline in its content.
    #[serde(default)]
    pub reasoning_markers: bool,
}

fn default_model() -> String {
    "deepseek/deepseek-r1".to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_error_message() -> String {
    DEFAULT_ERROR_MESSAGE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_stream_idle_timeout_secs() -> u64 {
    600
}

fn default_fallback_backend() -> Option<String> {
    Some("deepseek".to_string())
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|name| !name.trim().is_empty()))
}

fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig {
            name: "gemini".to_string(),
            base_url: "https://gemini.erikpsw.works".to_string(),
            api_key_env: None,
        },
        BackendConfig {
            name: "deepseek".to_string(),
            base_url: "https://deepseek.erikpsw.works".to_string(),
            api_key_env: None,
        },
    ]
}

fn default_models() -> Vec<ModelRoute> {
    let route = |id: &str, label: &str, backend: &str, reasoning_markers: bool| ModelRoute {
        id: id.to_string(),
        label: label.to_string(),
        backend: backend.to_string(),
        reasoning_markers,
    };
    vec![
        route("deepseek/deepseek-chat", "DeepSeek Chat", "deepseek", false),
        route("deepseek/deepseek-r1", "DeepSeek R1", "deepseek", true),
        route("qwen/qwen-max", "Qwen Max", "deepseek", false),
        route("gemini", "Gemini", "gemini", false),
    ]
}

impl Default for WispConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            api_key_env: default_api_key_env(),
            error_message: default_error_message(),
            request_timeout_secs: default_request_timeout_secs(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
            fallback_backend: default_fallback_backend(),
            backends: default_backends(),
            models: default_models(),
        }
    }
}

impl WispConfig {
    /// Check that every route and the fallback name a defined backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for backend in &self.backends {
            if !names.insert(backend.name.as_str()) {
                return Err(ConfigError::DuplicateBackend(backend.name.clone()));
            }
            if backend.base_url.trim().is_empty() {
                return Err(ConfigError::EmptyBaseUrl(backend.name.clone()));
            }
        }

        for route in &self.models {
            if !names.contains(route.backend.as_str()) {
                return Err(ConfigError::UnknownBackend {
                    model: route.id.clone(),
                    backend: route.backend.clone(),
                });
            }
        }

        if let Some(ref fallback) = self.fallback_backend {
            if !names.contains(fallback.as_str()) {
                return Err(ConfigError::UnknownFallback(fallback.clone()));
            }
        }

        Ok(())
    }

    /// Clear a fallback that names no defined backend and return it.
    ///
    /// The stock fallback (`deepseek`) applies even when the file replaces
    /// the backend list, so a custom backend list usually needs this.
    pub fn drop_unknown_fallback(&mut self) -> Option<String> {
        let known = self
            .fallback_backend
            .as_deref()
            .is_none_or(|name| self.backends.iter().any(|b| b.name == name));
        if known {
            None
        } else {
            self.fallback_backend.take()
        }
    }

    /// Look up the route for a model identifier.
    pub fn route(&self, model: &str) -> Option<&ModelRoute> {
        self.models.iter().find(|r| r.id == model)
    }
}
