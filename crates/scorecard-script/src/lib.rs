//! # scorecard-script
//!
//! Google Apps Script emitter for scorecard.
//!
//! The generated function builds the form, links a response spreadsheet and
//! writes the `_reference` lookup table and `Section Scoring` formulas into
//! it. Scores match the ones the XLSX workbook computes for the same answers.

pub mod emit;
pub mod error;
pub mod js;

pub use emit::{
    emit_script, scoring_rows, ScriptOptions, DEFAULT_FUNCTION_NAME, DEFAULT_RESPONSE_ROWS,
    SCORING_SHEET,
};
pub use error::{ScriptError, ScriptResult};
