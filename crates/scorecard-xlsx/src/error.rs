//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during XLSX emission, reading and writing
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Sheet name rejected by the workbook
    #[error("Invalid sheet name '{0}': {1}")]
    InvalidSheetName(String, &'static str),

    /// Sheet name already in use
    #[error("Duplicate sheet name: {0}")]
    DuplicateSheetName(String),

    /// Sheet index out of range
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Layout or synthesis error
    #[error("Core error: {0}")]
    Core(#[from] scorecard_core::Error),
}
