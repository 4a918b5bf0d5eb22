//! # scorecard
//!
//! Compiles a questionnaire into artifacts that score its answers.
//!
//! A YAML questionnaire of sections, questions and scored options becomes
//! either an XLSX workbook with drop-downs and live scoring formulas, or a
//! Google Apps Script that builds the same questionnaire as a form with a
//! scoring response sheet. Both compute the same 1-5 band per section.
//!
//! ## Example
//!
//! ```rust
//! use scorecard::prelude::*;
//!
//! let yaml = r#"
//! data_product_complexity:
//!   formTitle: Data Product Complexity
//!   sections:
//!     - section: Data Product Information
//!       questions:
//!         - question: Data product name
//!           questionType: ShortAnswer
//!     - section: Data Sources
//!       questions:
//!         - question: How many sources?
//!           questionType: DropDown
//!           options: [One, Many, Not sure]
//! "#;
//!
//! let assessment = scorecard::input::from_str(yaml).unwrap();
//! let bytes = render(&assessment, &GenerateOptions::new(OutputFormat::Excel)).unwrap();
//! assert!(bytes.starts_with(b"PK"));
//!
//! // Save to file
//! // generate(&assessment, &GenerateOptions::new(OutputFormat::Excel)).unwrap();
//! ```

pub mod error;
pub mod input;
pub mod normalize;
pub mod pipeline;
pub mod prelude;
pub mod validate;

pub use error::{Error, Result};
pub use input::{load_file, RawDocument};
pub use normalize::normalize_to_yaml;
pub use pipeline::{generate, render, write_atomic, GenerateOptions, OutputFormat};
pub use validate::validate;

// Re-export the model and the emitters
pub use scorecard_core::{
    AnswerOption, Assessment, Question, QuestionType, Section, NOT_SURE, NOT_SURE_SCORE,
};
pub use scorecard_script::{emit_script, ScriptOptions, DEFAULT_RESPONSE_ROWS};
pub use scorecard_xlsx::{emit_workbook, Workbook, XlsxReader, XlsxWriter};
