//! # scorecard-core
//!
//! Layout and formula synthesis for scorecard.
//!
//! This crate turns an [`Assessment`] into placed cells and scoring formulas:
//! - [`address`] - Column algebra, logical [`CellRef`]/[`RangeRef`] and A1 formatting
//! - [`registry`] - Write-once map from question id to its data region, scored region and answer slot
//! - [`layout`] - Places every question through a [`GridSink`]
//! - [`formula`] - Formula IR and the workbook/script scoring dialects
//! - [`sanitize`] - Central post-render cleanup
//!
//! ## Example
//!
//! ```rust
//! use scorecard_core::{
//!     Assessment, LayoutBuilder, LayoutStyle, MemoryGrid, Question, QuestionType,
//!     ScoringDialect, Section, WorkbookDialect,
//! };
//!
//! let info = Section::new("0", "Data Product Information")
//!     .with_question(Question::new("0.1", "Name", QuestionType::FreeText));
//! let sources = Section::new("1", "Data Sources").with_question(
//!     Question::new("1.1", "How many sources?", QuestionType::SingleSelect)
//!         .with_option("One", 0.0)
//!         .with_option("Many", 1.0)
//!         .with_option("Not sure", 0.5),
//! );
//! let assessment = Assessment::new("Complexity", info, vec![sources]);
//!
//! let mut grid = MemoryGrid::new();
//! let layout = LayoutBuilder::new(LayoutStyle::Workbook)
//!     .layout(&assessment, &mut grid)
//!     .unwrap();
//!
//! let question = assessment.question("1.1").unwrap();
//! let formula = WorkbookDialect
//!     .question_score_formula(question, &layout.registry)
//!     .unwrap()
//!     .unwrap();
//! assert!(formula.starts_with("=IF(Questions!$C$6=\"Not sure\",0.5,"));
//! ```

pub mod address;
pub mod error;
pub mod formula;
pub mod grid;
pub mod layout;
pub mod model;
pub mod registry;
pub mod sanitize;
pub mod sink;
pub mod value;

pub use address::{column_index, column_letters, A1Style, CellRef, RangeRef, RefFormatter};
pub use error::{AddressKind, Error, Result};
pub use formula::{
    section_aggregate, Expr, Function, ScoreTerms, ScoringDialect, ScriptDialect, WorkbookDialect,
};
pub use grid::{MemoryGrid, MemoryTable};
pub use layout::{
    Layout, LayoutBuilder, LayoutStyle, SectionPlan, DATA_SHEET, QUESTIONS_SHEET,
    REFERENCE_FIRST_LABEL_ROW, REFERENCE_SHEET, RESPONSES_SHEET,
};
pub use model::{
    is_not_sure_label, AnswerOption, Assessment, Question, QuestionType, Section,
    IDENTIFICATION_SECTION_ID, NOT_SURE, NOT_SURE_SCORE,
};
pub use registry::{AddressRegistry, QuestionAddress, ScoredRegion};
pub use sink::{GridSink, RegionHandle};
pub use value::CellContent;
