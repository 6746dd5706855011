//! Application state shared by every command.
//!
//! AppState holds the loaded configuration and the backend router built
//! from it. Chat sessions are created from it on demand.

use std::path::PathBuf;
use std::sync::Arc;

use wisp_core::chat::ChatSession;
use wisp_core::llm::router::BackendRouter;
use wisp_infra::config::{load_config, resolve_data_dir};
use wisp_infra::llm::build_router;
use wisp_types::config::WispConfig;

pub struct AppState {
    pub config: WispConfig,
    pub router: Arc<BackendRouter>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load configuration and build the router.
    pub async fn init(data_dir: Option<PathBuf>, api_key: Option<&str>) -> anyhow::Result<Self> {
        let data_dir = data_dir.unwrap_or_else(resolve_data_dir);
        let config = load_config(&data_dir).await;
        let router = build_router(&config, api_key)?;

        Ok(Self {
            config,
            router: Arc::new(router),
            data_dir,
        })
    }

    /// The model to use when none was given on the command line.
    pub fn model_or_default(&self, model: Option<String>) -> String {
        model.unwrap_or_else(|| self.config.default_model.clone())
    }

    /// A fresh session on `model` with the configured error message.
    pub fn new_session(&self, model: &str) -> ChatSession {
        ChatSession::new(Arc::clone(&self.router), model)
            .with_error_message(self.config.error_message.clone())
    }
}
