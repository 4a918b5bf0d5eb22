//! Form-script emitter
//!
//! Renders one Apps Script function that creates the form, links a response
//! spreadsheet, writes the hidden `_reference` lookup table and a
//! `Section Scoring` sheet scoring the first few response rows.

use scorecard_core::sanitize::{sanitize_formula, sanitize_script};
use scorecard_core::{
    A1Style, Assessment, CellContent, CellRef, Expr, LayoutBuilder, LayoutStyle, MemoryGrid,
    QuestionType, RefFormatter, ScoreTerms, ScoringDialect, ScriptDialect,
    REFERENCE_FIRST_LABEL_ROW, REFERENCE_SHEET, RESPONSES_SHEET,
};
use serde::Serialize;
use tracing::debug;

use crate::error::{ScriptError, ScriptResult};
use crate::js::{rows_literal, to_js};

/// Name of the scoring sheet in the response spreadsheet
pub const SCORING_SHEET: &str = "Section Scoring";

/// Default number of response rows the scoring sheet covers
pub const DEFAULT_RESPONSE_ROWS: u32 = 4;

/// Default name of the generated function
pub const DEFAULT_FUNCTION_NAME: &str = "createDataProductComplexityForm";

/// Script emitter options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOptions {
    /// Response rows (from row 2 of the response sheet) given a scoring row
    pub response_rows: u32,
    /// Name of the generated top-level function
    pub function_name: String,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            response_rows: DEFAULT_RESPONSE_ROWS,
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
        }
    }
}

impl ScriptOptions {
    fn validate(&self) -> ScriptResult<()> {
        if self.response_rows == 0 {
            return Err(ScriptError::InvalidOption {
                name: "response_rows",
                reason: "must be at least 1".into(),
            });
        }
        let mut chars = self.function_name.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if !valid {
            return Err(ScriptError::InvalidOption {
                name: "function_name",
                reason: format!("'{}' is not a JavaScript identifier", self.function_name),
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormConfig<'a> {
    form_title: &'a str,
    sections: Vec<FormSection<'a>>,
}

#[derive(Serialize)]
struct FormSection<'a> {
    section: &'a str,
    questions: Vec<FormQuestion<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormQuestion<'a> {
    question: &'a str,
    description: &'a str,
    question_type: QuestionType,
    options: Vec<&'a str>,
}

impl<'a> FormConfig<'a> {
    fn new(assessment: &'a Assessment) -> Self {
        let sections = assessment
            .sections()
            .map(|section| FormSection {
                section: &section.title,
                questions: section
                    .questions
                    .iter()
                    .map(|q| FormQuestion {
                        question: &q.text,
                        description: &q.description,
                        question_type: q.kind,
                        options: q.options.iter().map(|o| o.text.as_str()).collect(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            form_title: &assessment.title,
            sections,
        }
    }
}

/// The `Section Scoring` rows: a header, then one row per response row
///
/// Each row links the response timestamp and holds one band formula per
/// scorable section, averaging that row's question scores.
pub fn scoring_rows(
    assessment: &Assessment,
    layout: &scorecard_core::Layout,
    response_rows: u32,
) -> ScriptResult<Vec<Vec<CellContent>>> {
    let mut rows = Vec::with_capacity(response_rows as usize + 1);

    let header = std::iter::once(CellContent::from("Response Time"))
        .chain(
            assessment
                .scorable
                .iter()
                .map(|s| CellContent::from(format!("{} score", s.title))),
        )
        .collect();
    rows.push(header);

    for offset in 0..response_rows {
        let dialect = ScriptDialect::new(offset);
        // Row 1 of the response sheet is its header
        let timestamp = CellRef::new(RESPONSES_SHEET, offset + 2, 1);
        let mut row = vec![CellContent::formula(A1Style::SCRIPT.cell(&timestamp))];

        for section in &assessment.scorable {
            let mut terms: Vec<Expr> = Vec::new();
            for question in section.scored_questions() {
                if let Some(score) = dialect.question_score(question, &layout.registry)? {
                    terms.push(score);
                }
            }
            let formula = dialect.section_aggregate_formula(ScoreTerms::Inline(terms));
            row.push(CellContent::formula(sanitize_formula(&formula)));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Render the Apps Script for `assessment`
pub fn emit_script(assessment: &Assessment, options: &ScriptOptions) -> ScriptResult<String> {
    options.validate()?;

    let mut grid = MemoryGrid::new();
    let layout = LayoutBuilder::new(LayoutStyle::ResponseTable).layout(assessment, &mut grid)?;

    let reference = grid
        .table(REFERENCE_SHEET)
        .ok_or_else(|| ScriptError::MissingTable(REFERENCE_SHEET.to_string()))?;
    let scoring = scoring_rows(assessment, &layout, options.response_rows)?;
    let config = serde_json::to_value(FormConfig::new(assessment))?;

    let script = fill_template(
        SCRIPT_TEMPLATE,
        &[
            ("function_name", options.function_name.clone()),
            ("config", to_js(&config)),
            ("reference_sheet", REFERENCE_SHEET.to_string()),
            ("reference_rows", rows_literal(&reference.rows())),
            ("first_label_row", REFERENCE_FIRST_LABEL_ROW.to_string()),
            ("label_row_count", assessment.max_option_count().to_string()),
            ("scoring_sheet", SCORING_SHEET.to_string()),
            ("scoring_rows", rows_literal(&scoring)),
        ],
    );

    debug!(
        questions = layout.registry.len(),
        scoring_rows = scoring.len(),
        "script emitted"
    );

    Ok(sanitize_script(&script))
}

/// Substitute `{{key}}` placeholders in one pass
///
/// Substituted text is never rescanned, so questionnaire text that happens
/// to contain a placeholder comes through unchanged.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let replaced = after.find("}}").and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (value, end))
        });
        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

const SCRIPT_TEMPLATE: &str = r#"/**
 * Auto-generated by scorecard.
 * Creates a Google Form and a linked response spreadsheet. Every question is
 * required; the spreadsheet gets a hidden '{{reference_sheet}}' lookup table
 * and a '{{scoring_sheet}}' sheet with one 1-5 band per section.
 */
function {{function_name}}() {
  const config = {{config}};

  // 1) Create form and response sheet
  const form = FormApp.create(config.formTitle);
  const sheet = SpreadsheetApp.create(config.formTitle + ' Responses');
  form.setDestination(FormApp.DestinationType.SPREADSHEET, sheet.getId());

  // 2) Build form sections and questions
  config.sections.forEach(section => {
    form.addPageBreakItem().setTitle(section.section);
    section.questions.forEach(q => {
      const helpText = q.description || '';
      switch (q.questionType) {
        case 'ShortAnswer':
          form.addTextItem()
              .setTitle(q.question)
              .setHelpText(helpText)
              .setRequired(true);
          break;
        case 'DropDown':
          form.addListItem()
              .setTitle(q.question)
              .setHelpText(helpText)
              .setChoiceValues(q.options)
              .setRequired(true);
          break;
        case 'CheckBox':
          form.addCheckboxItem()
              .setTitle(q.question)
              .setHelpText(helpText)
              .setChoiceValues(q.options)
              .setRequired(true);
          break;
        default:
          throw new Error('Unknown questionType: ' + q.questionType);
      }
    });
  });

  // 3) Reference sheet
  const refName = '{{reference_sheet}}';
  let refSheet = sheet.getSheetByName(refName);
  if (refSheet) sheet.deleteSheet(refSheet);
  refSheet = sheet.insertSheet(refName);

  const refData = {{reference_rows}};
  const labelRows = {{label_row_count}};
  if (labelRows > 0) {
    // Keep labels such as '5' or '1/2' as text so MATCH finds them
    refSheet.getRange({{first_label_row}}, 1, labelRows, refData[0].length)
            .setNumberFormat('@');
  }
  refSheet.getRange(1, 1, refData.length, refData[0].length)
          .setValues(refData);
  refSheet.hideSheet();

  // 4) Section scoring sheet
  const scoreName = '{{scoring_sheet}}';
  let scoreSheet = sheet.getSheetByName(scoreName);
  if (scoreSheet) sheet.deleteSheet(scoreSheet);
  scoreSheet = sheet.insertSheet(scoreName);

  const scoreSheetData = {{scoring_rows}};
  scoreSheet.getRange(1, 1, scoreSheetData.length, scoreSheetData[0].length)
            .setValues(scoreSheetData);

  // 5) Log URLs
  Logger.log('Form URL: ' + form.getEditUrl());
  Logger.log('Sheet URL: ' + sheet.getUrl());
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scorecard_core::{Question, Section, NOT_SURE};

    fn sample() -> Assessment {
        let info = Section::new("0", "Data Product Information")
            .with_question(Question::new("0.1", "Data product name", QuestionType::FreeText));
        let question = |id: &str| {
            Question::new(id, format!("Question {id}"), QuestionType::SingleSelect)
                .with_option("Low", 0.0)
                .with_option("High", 1.0)
                .with_option(NOT_SURE, 0.5)
        };
        Assessment::new(
            "Complexity",
            info,
            vec![Section::new("1", "Data Sources")
                .with_question(question("1.1"))
                .with_question(question("1.2"))],
        )
    }

    #[test]
    fn test_scoring_rows() {
        let assessment = sample();
        let mut grid = MemoryGrid::new();
        let layout = LayoutBuilder::new(LayoutStyle::ResponseTable)
            .layout(&assessment, &mut grid)
            .unwrap();

        let rows = scoring_rows(&assessment, &layout, 2).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            vec![
                CellContent::from("Response Time"),
                CellContent::from("Data Sources score")
            ]
        );
        assert_eq!(rows[2][0], CellContent::formula("='Form Responses 1'!A3"));

        let q11 = "IF(ISBLANK('Form Responses 1'!C3),\"\",IF('Form Responses 1'!C3=\"Not sure\",0.5,IFERROR(INDEX('_reference'!$C$9:$C$11,MATCH('Form Responses 1'!C3,'_reference'!$C$6:$C$8,0)),\"\")))";
        let formula = rows[2][1].as_formula().unwrap();
        assert!(
            formula.starts_with(&format!("=IFERROR(MIN(5,INT(ROUND(AVERAGE({{{q11},")),
            "{formula}"
        );
    }

    #[test]
    fn test_fill_template() {
        let values = [("a", "{{b}}".to_string()), ("b", "x".to_string())];
        assert_eq!(fill_template("<{{a}}|{{b}}|{{c}}>", &values), "<{{b}}|x|{{c}}>");
    }

    #[test]
    fn test_invalid_options() {
        let assessment = sample();
        let zero_rows = ScriptOptions {
            response_rows: 0,
            ..ScriptOptions::default()
        };
        assert!(matches!(
            emit_script(&assessment, &zero_rows),
            Err(ScriptError::InvalidOption { name: "response_rows", .. })
        ));
        let bad_name = ScriptOptions {
            function_name: "1form".into(),
            ..ScriptOptions::default()
        };
        assert!(emit_script(&assessment, &bad_name).is_err());
    }
}
