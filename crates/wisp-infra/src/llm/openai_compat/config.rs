//! Configuration for one OpenAI-compatible backend.

use std::time::Duration;

use secrecy::SecretString;

use wisp_types::config::{BackendConfig, WispConfig};

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Backend name (e.g., "deepseek", "gemini").
    pub provider_name: String,
    /// Base URL for the API; `/chat/completions` is appended.
    pub base_url: String,
    /// Bearer token. Requests go out unauthenticated when absent.
    pub api_key: Option<SecretString>,
    /// Connect timeout for every request, and the whole-request deadline
    /// for non-streaming completions.
    pub request_timeout: Duration,
    /// Maximum silence between two stream events.
    pub stream_idle_timeout: Duration,
}

impl OpenAiCompatConfig {
    /// Build the provider configuration for one configured backend.
    pub fn from_backend(
        config: &WispConfig,
        backend: &BackendConfig,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            provider_name: backend.name.clone(),
            base_url: backend.base_url.clone(),
            api_key,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            stream_idle_timeout: Duration::from_secs(config.stream_idle_timeout_secs),
        }
    }
}

/// Full chat completions URL for a base URL.
///
/// A trailing slash on the base is ignored.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}
