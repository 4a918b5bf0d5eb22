//! Artifact generation
//!
//! Renders an assessment fully in memory, then writes it to a temporary file
//! next to the destination and renames it into place. A failed run leaves
//! no partial file behind.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use scorecard_core::Assessment;
use scorecard_script::{emit_script, ScriptOptions, DEFAULT_RESPONSE_ROWS};
use scorecard_xlsx::{emit_workbook, XlsxWriter};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Which artifact to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// XLSX workbook with live formulas
    #[default]
    Excel,
    /// Google Apps Script building a form and response sheet
    GoogleForm,
}

impl OutputFormat {
    /// Output path used when none is given
    pub fn default_output(self) -> PathBuf {
        match self {
            OutputFormat::Excel => PathBuf::from("data_product_complexity_tool.xlsx"),
            OutputFormat::GoogleForm => PathBuf::from("data_product_complexity_tool.gs"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Excel => f.write_str("excel"),
            OutputFormat::GoogleForm => f.write_str("google-form"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "excel" => Ok(OutputFormat::Excel),
            "google-form" => Ok(OutputFormat::GoogleForm),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Options for [`generate`]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub format: OutputFormat,
    pub output: PathBuf,
    /// Response rows scored by the form script
    pub response_rows: u32,
}

impl GenerateOptions {
    /// Options writing `format` to its default output path
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            output: format.default_output(),
            response_rows: DEFAULT_RESPONSE_ROWS,
        }
    }

    pub fn with_output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_response_rows(mut self, rows: u32) -> Self {
        self.response_rows = rows;
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

/// Render the artifact bytes without touching the filesystem
pub fn render(assessment: &Assessment, options: &GenerateOptions) -> Result<Vec<u8>> {
    let bytes = match options.format {
        OutputFormat::Excel => {
            let workbook = emit_workbook(assessment)?;
            XlsxWriter::write_to_vec(&workbook)?
        }
        OutputFormat::GoogleForm => {
            let script_options = ScriptOptions {
                response_rows: options.response_rows,
                ..ScriptOptions::default()
            };
            let mut script = emit_script(assessment, &script_options)?;
            if !script.ends_with('\n') {
                script.push('\n');
            }
            script.into_bytes()
        }
    };
    debug!(format = %options.format, bytes = bytes.len(), "artifact rendered");
    Ok(bytes)
}

/// Render the artifact and write it to `options.output`
pub fn generate(assessment: &Assessment, options: &GenerateOptions) -> Result<PathBuf> {
    let bytes = render(assessment, options)?;
    write_atomic(&options.output, &bytes)?;
    info!(
        format = %options.format,
        path = %options.output.display(),
        "artifact written"
    );
    Ok(options.output.clone())
}

/// Write `bytes` to `path` through a temporary file in the same directory
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
