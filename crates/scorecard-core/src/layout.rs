//! Layout builder
//!
//! Walks the assessment in document order and decides where every question
//! lives. Two passes run over the same traversal:
//!
//! 1. the data pass writes each question's metadata rows, option labels and
//!    option scores into the auxiliary table and records its data region and
//!    scored region;
//! 2. the answer pass records one answer slot per question in the answer
//!    table.
//!
//! Two styles exist. [`LayoutStyle::Workbook`] stacks question blocks down a
//! hidden `_data` sheet and puts answers on a `Questions` sheet:
//!
//! ```text
//! _data                               Questions
//! | Key         | Value    | Score |  | 1   | Data Sources       |        |
//! | Title       | How many |       |  | 1.1 | How many sources?  | [High] |
//! | Description | ...      |       |  |     | (description)      |        |
//! | NumOptions  | 4        |       |  | 1.2 | ...                | [....] |
//! | Option_1    | Low      | 0     |
//! | Option_2    | Medium   | 0.5   |
//! | ...                            |
//! ```
//!
//! [`LayoutStyle::ResponseTable`] gives every question one column of a
//! shared `_reference` table and reads answers from the matching column of
//! the form's response sheet.

use tracing::debug;

use crate::address::{CellRef, RangeRef};
use crate::error::Result;
use crate::model::{Assessment, Question};
use crate::registry::{AddressRegistry, ScoredRegion};
use crate::sink::{GridSink, RegionHandle};
use crate::value::CellContent;

/// Visible answer sheet of the workbook
pub const QUESTIONS_SHEET: &str = "Questions";
/// Hidden lookup sheet of the workbook
pub const DATA_SHEET: &str = "_data";
/// Shared lookup table of the linked response spreadsheet
pub const REFERENCE_SHEET: &str = "_reference";
/// Sheet the form writes its responses to
pub const RESPONSES_SHEET: &str = "Form Responses 1";

/// Title, description and option count
const METADATA_ROWS: u32 = 3;
/// Blank rows between two question blocks on `_data`
const BLOCK_SPACING: u32 = 1;
/// First `_data` row below the header
const DATA_FIRST_ROW: u32 = 2;
/// Column holding each question's answer on `Questions`
const ANSWER_COLUMN: u32 = 3;
/// Section, question, title, description and option count rows of `_reference`
const REFERENCE_METADATA_ROWS: u32 = 5;
/// First `_reference` row holding option labels
pub const REFERENCE_FIRST_LABEL_ROW: u32 = REFERENCE_METADATA_ROWS + 1;
/// Column A of `_reference` holds row labels; of the responses, the timestamp
const REFERENCE_FIRST_COLUMN: u32 = 2;
/// First response row below the form's header row
const FIRST_RESPONSE_ROW: u32 = 2;

/// Where regions and answer slots are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStyle {
    /// Stacked question blocks on `_data`, answers on `Questions`
    Workbook,
    /// One `_reference` column per question, answers in `Form Responses 1`
    ResponseTable,
}

impl LayoutStyle {
    /// Table holding the option lookup data
    pub fn data_table(self) -> &'static str {
        match self {
            LayoutStyle::Workbook => DATA_SHEET,
            LayoutStyle::ResponseTable => REFERENCE_SHEET,
        }
    }

    /// Table holding the answers
    pub fn answer_table(self) -> &'static str {
        match self {
            LayoutStyle::Workbook => QUESTIONS_SHEET,
            LayoutStyle::ResponseTable => RESPONSES_SHEET,
        }
    }
}

/// Answer-table placement of one section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlan {
    pub section_id: String,
    /// Row reserved for the section heading, if the style has one
    pub header: Option<CellRef>,
    /// Question ids in section order
    pub questions: Vec<String>,
}

/// Result of a layout pass
#[derive(Debug)]
pub struct Layout {
    pub style: LayoutStyle,
    pub registry: AddressRegistry,
    /// Sections that received answer slots, in document order
    pub answer_plan: Vec<SectionPlan>,
}

/// Computes the placement of every question and writes the data regions
#[derive(Debug, Clone, Copy)]
pub struct LayoutBuilder {
    style: LayoutStyle,
}

impl LayoutBuilder {
    pub fn new(style: LayoutStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> LayoutStyle {
        self.style
    }

    /// Lay out `assessment`, writing data regions into `sink`
    pub fn layout(&self, assessment: &Assessment, sink: &mut dyn GridSink) -> Result<Layout> {
        let mut registry = AddressRegistry::new();

        let answer_plan = match self.style {
            LayoutStyle::Workbook => {
                write_data_blocks(assessment, sink, &mut registry)?;
                place_answer_rows(assessment, sink, &mut registry)?
            }
            LayoutStyle::ResponseTable => {
                write_reference_columns(assessment, sink, &mut registry)?;
                place_response_columns(assessment, sink, &mut registry)?
            }
        };

        debug!(
            style = ?self.style,
            questions = registry.len(),
            sections = answer_plan.len(),
            "layout complete"
        );

        Ok(Layout {
            style: self.style,
            registry,
            answer_plan,
        })
    }
}

fn write_data_blocks(
    assessment: &Assessment,
    sink: &mut dyn GridSink,
    registry: &mut AddressRegistry,
) -> Result<()> {
    let total_rows: u32 = DATA_FIRST_ROW
        + assessment
            .questions()
            .map(|q| METADATA_ROWS + q.option_count() as u32 + BLOCK_SPACING)
            .sum::<u32>();
    let data = sink.create_region(DATA_SHEET, total_rows, 3)?;
    sink.set_region_visibility(data, true)?;

    for (col, label) in ["Key", "Value", "Score"].into_iter().enumerate() {
        sink.write_cell(data, 1, col as u32 + 1, label.into())?;
    }

    let mut cursor = DATA_FIRST_ROW;
    for section in assessment.sections() {
        // A section without questions must leave the cursor where it is
        for question in &section.questions {
            let height = write_data_block(sink, data, registry, question, cursor)?;
            cursor += height + BLOCK_SPACING;
        }
    }

    Ok(())
}

/// Write one question block starting at `top`, returning its height
fn write_data_block(
    sink: &mut dyn GridSink,
    data: RegionHandle,
    registry: &mut AddressRegistry,
    question: &Question,
    top: u32,
) -> Result<u32> {
    let options = question.option_count() as u32;
    let height = METADATA_ROWS + options;

    registry.record_data_region(
        &question.id,
        RangeRef::new(DATA_SHEET, top, 1, height, 3),
    )?;

    sink.write_cell(data, top, 1, "Title".into())?;
    sink.write_cell(data, top, 2, question.text.as_str().into())?;
    sink.write_cell(data, top + 1, 1, "Description".into())?;
    sink.write_cell(data, top + 1, 2, question.description.as_str().into())?;
    sink.write_cell(data, top + 2, 1, "NumOptions".into())?;
    sink.write_cell(data, top + 2, 2, question.option_count().into())?;

    let first_option = top + METADATA_ROWS;
    for (i, option) in question.options.iter().enumerate() {
        let row = first_option + i as u32;
        sink.write_cell(data, row, 1, format!("Option_{}", i + 1).into())?;
        sink.write_cell(data, row, 2, option.text.as_str().into())?;
        sink.write_cell(data, row, 3, option.score.into())?;
    }

    if options > 0 {
        registry.record_scored_region(
            &question.id,
            ScoredRegion::new(
                RangeRef::new(DATA_SHEET, first_option, 2, options, 1),
                RangeRef::new(DATA_SHEET, first_option, 3, options, 1),
            ),
        )?;
    }

    Ok(height)
}

fn place_answer_rows(
    assessment: &Assessment,
    sink: &mut dyn GridSink,
    registry: &mut AddressRegistry,
) -> Result<Vec<SectionPlan>> {
    let total_rows: u32 = assessment
        .sections()
        .filter(|s| !s.questions.is_empty())
        .map(|s| 2 + 2 * s.questions.len() as u32)
        .sum();
    sink.ensure_region(QUESTIONS_SHEET, total_rows, ANSWER_COLUMN)?;

    let mut plans = Vec::new();
    let mut row = 1;
    for section in assessment.sections() {
        if section.questions.is_empty() {
            continue;
        }

        let header = CellRef::new(QUESTIONS_SHEET, row, 1);
        row += 1;

        let mut questions = Vec::with_capacity(section.questions.len());
        for question in &section.questions {
            registry.record_answer_slot(
                &question.id,
                CellRef::new(QUESTIONS_SHEET, row, ANSWER_COLUMN),
            )?;
            questions.push(question.id.clone());
            // Title row, then description row
            row += 2;
        }
        row += 1;

        plans.push(SectionPlan {
            section_id: section.id.clone(),
            header: Some(header),
            questions,
        });
    }

    Ok(plans)
}

fn write_reference_columns(
    assessment: &Assessment,
    sink: &mut dyn GridSink,
    registry: &mut AddressRegistry,
) -> Result<()> {
    let max_options = assessment.max_option_count() as u32;
    let first_label_row = REFERENCE_FIRST_LABEL_ROW;
    let first_score_row = first_label_row + max_options;

    let reference = sink.create_region(
        REFERENCE_SHEET,
        REFERENCE_METADATA_ROWS + 2 * max_options,
        REFERENCE_FIRST_COLUMN + assessment.question_count() as u32,
    )?;
    sink.set_region_visibility(reference, true)?;

    let labels = [
        "Section Number",
        "Question Number",
        "Title",
        "Description",
        "NumOptions",
    ];
    for (i, label) in labels.into_iter().enumerate() {
        sink.write_cell(reference, i as u32 + 1, 1, label.into())?;
    }
    for i in 0..max_options {
        sink.write_cell(
            reference,
            first_label_row + i,
            1,
            format!("Option_{}", i + 1).into(),
        )?;
        sink.write_cell(
            reference,
            first_score_row + i,
            1,
            format!("Score_{}", i + 1).into(),
        )?;
    }

    let mut col = REFERENCE_FIRST_COLUMN;
    for section in assessment.sections() {
        for question in &section.questions {
            let options = question.option_count() as u32;
            registry.record_data_region(
                &question.id,
                RangeRef::new(REFERENCE_SHEET, 1, col, REFERENCE_METADATA_ROWS + max_options + options, 1),
            )?;

            let metadata = [
                CellContent::from(section.id.as_str()),
                CellContent::from(question.id.as_str()),
                CellContent::from(question.text.as_str()),
                CellContent::from(question.description.as_str()),
                CellContent::from(question.option_count()),
            ];
            for (i, value) in metadata.into_iter().enumerate() {
                sink.write_cell(reference, i as u32 + 1, col, value)?;
            }

            for (i, option) in question.options.iter().enumerate() {
                let i = i as u32;
                sink.write_cell(reference, first_label_row + i, col, option.text.as_str().into())?;
                sink.write_cell(reference, first_score_row + i, col, option.score.into())?;
            }

            if options > 0 {
                registry.record_scored_region(
                    &question.id,
                    ScoredRegion::new(
                        RangeRef::new(REFERENCE_SHEET, first_label_row, col, options, 1),
                        RangeRef::new(REFERENCE_SHEET, first_score_row, col, options, 1),
                    ),
                )?;
            }

            col += 1;
        }
    }

    Ok(())
}

fn place_response_columns(
    assessment: &Assessment,
    sink: &mut dyn GridSink,
    registry: &mut AddressRegistry,
) -> Result<Vec<SectionPlan>> {
    sink.ensure_region(
        RESPONSES_SHEET,
        FIRST_RESPONSE_ROW,
        REFERENCE_FIRST_COLUMN + assessment.question_count() as u32,
    )?;

    let mut plans = Vec::new();
    let mut col = REFERENCE_FIRST_COLUMN;
    for section in assessment.sections() {
        if section.questions.is_empty() {
            continue;
        }

        let mut questions = Vec::with_capacity(section.questions.len());
        for question in &section.questions {
            registry.record_answer_slot(
                &question.id,
                CellRef::new(RESPONSES_SHEET, FIRST_RESPONSE_ROW, col),
            )?;
            questions.push(question.id.clone());
            col += 1;
        }

        plans.push(SectionPlan {
            section_id: section.id.clone(),
            header: None,
            questions,
        });
    }

    Ok(plans)
}
