//! Workbook emitter
//!
//! Builds the three sheets of the generated tool:
//!
//! - `Questions` - one heading per section, a title row per question with the
//!   answer drop-down in column C, and the question's description below it;
//! - `Score` - one row per scorable section with the 1-5 band in column B and
//!   the per-question scores it averages in hidden columns C onwards;
//! - `_data` - hidden question blocks the drop-downs and lookups read from.

use scorecard_core::sanitize::sanitize_formula;
use scorecard_core::{
    column_letters, A1Style, Assessment, CellContent, GridSink, Layout, LayoutBuilder,
    LayoutStyle, QuestionType, RangeRef, RefFormatter, ScoreTerms, ScoringDialect,
    WorkbookDialect, DATA_SHEET, NOT_SURE, QUESTIONS_SHEET,
};
use tracing::debug;

use crate::error::{XlsxError, XlsxResult};
use crate::workbook::{CellStyle, ConditionalFormat, Workbook, Worksheet};

/// Per-section band sheet
pub const SCORE_SHEET: &str = "Score";

/// Headers of the `Score` sheet
pub const SCORE_HEADERS: [&str; 2] = ["Section", "Final Score (1\u{2013}5)"];

/// Colour scale stops of the band column: green, yellow, red
const BAND_COLOURS: [(f64, &str); 3] = [(1.0, "FF92D050"), (3.0, "FFFFFF00"), (5.0, "FFFF0000")];

/// Fill of answers still set to "Not sure"
const NOT_SURE_FILL: &str = "FFFFFFCC";

/// First column of the hidden per-question score terms
const FIRST_TERM_COLUMN: u32 = 3;

/// Build the workbook for `assessment`
pub fn emit_workbook(assessment: &Assessment) -> XlsxResult<Workbook> {
    let mut workbook = Workbook::new();
    let layout = LayoutBuilder::new(LayoutStyle::Workbook).layout(assessment, &mut workbook)?;

    fill_questions(assessment, &layout, &mut workbook)?;
    build_score_sheet(assessment, &layout, &mut workbook)?;

    for sheet in workbook.worksheets_mut() {
        sanitize_sheet(sheet);
    }

    let data = workbook
        .sheet_index(DATA_SHEET)
        .ok_or_else(|| XlsxError::MissingPart(DATA_SHEET.to_string()))?;
    let last = workbook.sheet_count() - 1;
    workbook.move_worksheet(data, last)?;

    debug!(
        sheets = workbook.sheet_count(),
        formulas = workbook.worksheets().map(Worksheet::formula_count).sum::<usize>(),
        "workbook emitted"
    );

    Ok(workbook)
}

fn fill_questions(
    assessment: &Assessment,
    layout: &Layout,
    workbook: &mut Workbook,
) -> XlsxResult<()> {
    let registry = &layout.registry;

    // Drop-downs go through the sink before the sheet is borrowed for writing
    for question in assessment.questions() {
        if question.kind.has_options() && !question.options.is_empty() {
            let slot = registry.answer_slot_of(&question.id)?;
            let labels = &registry.scored_region_of(&question.id)?.labels;
            workbook.constrain_to_list(slot, labels)?;
        }
    }

    let sheet = workbook
        .worksheet_by_name_mut(QUESTIONS_SHEET)
        .ok_or_else(|| XlsxError::MissingPart(QUESTIONS_SHEET.to_string()))?;

    for plan in &layout.answer_plan {
        let Some(section) = assessment.sections().find(|s| s.id == plan.section_id) else {
            continue;
        };

        if let Some(header) = &plan.header {
            sheet.set_cell(header.row, 1, section.id.as_str().into(), CellStyle::Bold);
            sheet.set_cell(header.row, 2, section.title.as_str().into(), CellStyle::Bold);
        }

        for question in &section.questions {
            let slot = registry.answer_slot_of(&question.id)?;
            let row = slot.row;

            sheet.set_value(row, 1, question.id.as_str().into());
            sheet.set_cell(row, 2, question.text.as_str().into(), CellStyle::Bold);
            if question.kind == QuestionType::SingleSelect {
                if let Some(sentinel) = question.not_sure_option() {
                    sheet.set_value(row, slot.col, sentinel.text.as_str().into());
                }
            }

            // The description is read from the question's data block
            let description = registry.data_region_of(&question.id)?.cell_at(1, 1);
            sheet.set_cell(
                row + 1,
                2,
                CellContent::formula(A1Style::WORKBOOK.cell(&description)),
                CellStyle::Italic,
            );
        }
    }

    for col in 1..=3 {
        sheet.fit_column_width(col);
    }

    let last_row = sheet.max_row().max(1);
    let answers = column_letters(3);
    sheet.add_conditional_format(ConditionalFormat::HighlightText {
        sqref: format!("{answers}1:{answers}{last_row}"),
        text: NOT_SURE.to_string(),
        fill: NOT_SURE_FILL.to_string(),
    });

    Ok(())
}

fn build_score_sheet(
    assessment: &Assessment,
    layout: &Layout,
    workbook: &mut Workbook,
) -> XlsxResult<()> {
    let dialect = WorkbookDialect;
    let index = workbook.add_worksheet_with_name(SCORE_SHEET)?;
    let count = workbook.sheet_count();
    let sheet = workbook
        .worksheet_mut(index)
        .ok_or(XlsxError::SheetOutOfBounds(index, count))?;

    for (col, header) in SCORE_HEADERS.iter().enumerate() {
        sheet.set_cell(1, col as u32 + 1, (*header).into(), CellStyle::Bold);
    }

    let mut widest = 0;
    for (i, section) in assessment.scorable.iter().enumerate() {
        let row = i as u32 + 2;
        sheet.set_value(row, 1, section.title.as_str().into());

        let mut terms = 0;
        for question in &section.questions {
            if let Some(formula) = dialect.question_score_formula(question, &layout.registry)? {
                sheet.set_value(
                    row,
                    FIRST_TERM_COLUMN + terms,
                    CellContent::formula(formula),
                );
                terms += 1;
            }
        }
        widest = widest.max(terms);

        let terms = if terms == 0 {
            ScoreTerms::Inline(Vec::new())
        } else {
            ScoreTerms::Cells(RangeRef::new(SCORE_SHEET, row, FIRST_TERM_COLUMN, 1, terms))
        };
        sheet.set_value(
            row,
            2,
            CellContent::formula(dialect.section_aggregate_formula(terms)),
        );
    }

    sheet.fit_column_width(1);
    sheet.fit_column_width(2);
    for col in FIRST_TERM_COLUMN..FIRST_TERM_COLUMN + widest {
        sheet.set_column_hidden(col, true);
    }

    let sections = assessment.scorable.len() as u32;
    if sections > 0 {
        sheet.add_conditional_format(ConditionalFormat::ColorScale {
            sqref: format!("B2:B{}", sections + 1),
            stops: BAND_COLOURS.map(|(value, colour)| (value, colour.to_string())),
        });
    }

    Ok(())
}

fn sanitize_sheet(sheet: &mut Worksheet) {
    for (_, _, cell) in sheet.iter_cells_mut() {
        if let CellContent::Formula(text) = &cell.value {
            cell.value = CellContent::formula(sanitize_formula(text));
        }
    }
}
