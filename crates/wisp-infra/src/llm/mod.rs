//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`]
//! trait defined in `wisp-core`, a router factory ([`build_router`]) that
//! registers one provider per configured backend, and a connection check
//! ([`test_model_connection`]).
//!
//! [`LlmProvider`]: wisp_core::llm::provider::LlmProvider

pub mod openai_compat;

use anyhow::Context;
use tracing::{debug, warn};

use wisp_core::llm::box_provider::BoxLlmProvider;
use wisp_core::llm::router::BackendRouter;
use wisp_types::config::WispConfig;
use wisp_types::llm::{CompletionRequest, CompletionResponse, LlmError, Message, MessageRole};

use crate::config::resolve_api_key;

use self::openai_compat::config::OpenAiCompatConfig;
use self::openai_compat::OpenAiCompatibleProvider;

/// Build the backend router described by a configuration.
///
/// Validates the configuration, registers one provider per backend, adds
/// every model route, and sets the fallback. A backend without an API key
/// is still registered; a warning is logged.
pub fn build_router(config: &WispConfig, api_key_override: Option<&str>) -> anyhow::Result<BackendRouter> {
    config.validate().context("invalid configuration")?;

    let mut router = BackendRouter::new();
    for backend in &config.backends {
        let api_key = resolve_api_key(config, backend, api_key_override);
        if api_key.is_none() {
            warn!(
                backend = %backend.name,
                env = backend.api_key_env.as_deref().unwrap_or(&config.api_key_env),
                "no API key found; requests will be sent unauthenticated"
            );
        }

        let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_backend(
            config, backend, api_key,
        ))
        .with_context(|| format!("failed to create provider for backend '{}'", backend.name))?;
        debug!(backend = %backend.name, endpoint = provider.endpoint(), "registered backend");
        router.register_backend(backend.name.clone(), BoxLlmProvider::new(provider));
    }

    for route in &config.models {
        router.add_route(route.clone());
    }
    router.set_fallback(config.fallback_backend.clone());

    Ok(router)
}

/// Test connectivity for a model by sending a minimal non-streaming request.
///
/// Resolves the model through the router exactly as a chat submission would.
pub async fn test_model_connection(
    router: &BackendRouter,
    model: &str,
) -> Result<CompletionResponse, LlmError> {
    let resolved = router.resolve(model)?;
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message {
            role: MessageRole::User,
            content: "Hello".to_string(),
        }],
        stream: false,
    };
    resolved.provider.complete(&request).await
}
