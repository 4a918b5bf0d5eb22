//! Error types for scorecard-script

use thiserror::Error;

/// Result type for script generation
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// Layout or synthesis error
    #[error("Core error: {0}")]
    Core(#[from] scorecard_core::Error),

    /// The form configuration could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A table the script embeds was not produced by the layout
    #[error("Missing table: {0}")]
    MissingTable(String),

    /// Rejected emitter option
    #[error("Invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}
