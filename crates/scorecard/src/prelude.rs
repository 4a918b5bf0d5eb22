//! Prelude module - common imports for scorecard users
//!
//! ```rust
//! use scorecard::prelude::*;
//! ```

pub use crate::{
    generate,
    load_file,
    render,
    // Model types
    Assessment,
    Error,
    GenerateOptions,
    OutputFormat,
    Question,
    QuestionType,
    Result,
    Section,
    // I/O types
    XlsxReader,
    XlsxWriter,
};
