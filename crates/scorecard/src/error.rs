//! Error types for scorecard

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not valid YAML or does not fit the document shape
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// The document parsed but breaks questionnaire rules
    #[error("Invalid questionnaire:\n- {}", .0.join("\n- "))]
    Invalid(Vec<String>),

    /// Unknown output format name
    #[error("Unknown output format '{0}' (expected 'excel' or 'google-form')")]
    UnknownFormat(String),

    #[error(transparent)]
    Core(#[from] scorecard_core::Error),

    #[error(transparent)]
    Xlsx(#[from] scorecard_xlsx::XlsxError),

    #[error(transparent)]
    Script(#[from] scorecard_script::ScriptError),
}
