//! Backend router for per-model endpoint selection.
//!
//! A lookup table from model identifier to the backend that serves it,
//! plus an optional fallback for unlisted models. The chat session asks
//! the router and never branches on model names itself.

use std::collections::HashMap;

use tracing::debug;

use wisp_types::config::ModelRoute;
use wisp_types::llm::LlmError;

use super::box_provider::BoxLlmProvider;

/// The result of resolving a model identifier.
pub struct Resolved<'a> {
    pub provider: &'a BoxLlmProvider,
    /// Whether the model emits inline reasoning markers.
    pub reasoning_markers: bool,
    /// False when the model had no route and the fallback was used.
    pub routed: bool,
}

/// Registry of backends plus the model routing table.
pub struct BackendRouter {
    backends: HashMap<String, BoxLlmProvider>,
    routes: Vec<ModelRoute>,
    fallback: Option<String>,
}

impl BackendRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            routes: Vec::new(),
            fallback: None,
        }
    }

    /// Register a backend under the given name.
    ///
    /// If a backend with this name already exists, it is replaced.
    pub fn register_backend(&mut self, name: impl Into<String>, provider: BoxLlmProvider) {
        self.backends.insert(name.into(), provider);
    }

    /// Add a model route. A later route for the same id replaces the earlier one.
    pub fn add_route(&mut self, route: ModelRoute) {
        self.routes.retain(|r| r.id != route.id);
        self.routes.push(route);
    }

    /// Backend used for models without a route.
    pub fn set_fallback(&mut self, backend: Option<String>) {
        self.fallback = backend;
    }

    /// Routes in insertion order.
    pub fn routes(&self) -> &[ModelRoute] {
        &self.routes
    }

    /// Look up the route for a model, if one is configured.
    pub fn route(&self, model: &str) -> Option<&ModelRoute> {
        self.routes.iter().find(|r| r.id == model)
    }

    /// List all registered backend names, sorted.
    pub fn backend_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a model identifier to its backend.
    ///
    /// Unrouted models go to the fallback backend with reasoning markers off.
    pub fn resolve(&self, model: &str) -> Result<Resolved<'_>, LlmError> {
        if let Some(route) = self.route(model) {
            let provider = self
                .backends
                .get(&route.backend)
                .ok_or_else(|| LlmError::NoBackend(model.to_string()))?;
            return Ok(Resolved {
                provider,
                reasoning_markers: route.reasoning_markers,
                routed: true,
            });
        }

        let provider = self
            .fallback
            .as_deref()
            .and_then(|name| self.backends.get(name))
            .ok_or_else(|| LlmError::NoBackend(model.to_string()))?;
        debug!(model, backend = provider.name(), "model has no route, using fallback backend");
        Ok(Resolved {
            provider,
            reasoning_markers: false,
            routed: false,
        })
    }
}

impl Default for BackendRouter {
    fn default() -> Self {
        Self::new()
    }
}
