//! Error types for extplan-cli

use std::path::PathBuf;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from extplan-model
    #[error(transparent)]
    Model(#[from] extplan_model::Error),

    /// Error from extplan-planner
    #[error(transparent)]
    Planner(#[from] extplan_planner::Error),

    /// Two constraints given on the command line do not intersect
    #[error(transparent)]
    Incompatible(#[from] extplan_model::IncompatibleVersionConstraint),

    /// Invalid configuration file
    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// JSON output failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
