//! # scorecard-xlsx
//!
//! Workbook emitter and XLSX (Office Open XML) writer and reader for scorecard.

pub mod emit;
pub mod error;
pub mod reader;
pub mod workbook;
pub mod writer;

pub use emit::{emit_workbook, SCORE_HEADERS, SCORE_SHEET};
pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use workbook::{CellStyle, ColumnInfo, ConditionalFormat, ListValidation, Workbook, Worksheet};
pub use writer::XlsxWriter;
