use thiserror::Error;

/// Violations of the conversation log's placeholder invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    #[error("an assistant placeholder is already being extended")]
    PlaceholderActive,

    #[error("no assistant placeholder is being extended")]
    NoPlaceholder,
}

/// Errors surfaced by chat session operations.
///
/// Network and stream failures are not here: those are absorbed by the
/// session and turned into the fixed error entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a submission is already in flight")]
    Busy,

    #[error(transparent)]
    Log(#[from] LogError),
}

/// Errors from validating a loaded configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("model '{model}' routes to unknown backend '{backend}'")]
    UnknownBackend { model: String, backend: String },

    #[error("fallback backend '{0}' is not defined")]
    UnknownFallback(String),

    #[error("backend '{0}' is defined more than once")]
    DuplicateBackend(String),

    #[error("backend '{0}' has an empty base_url")]
    EmptyBaseUrl(String),
}
