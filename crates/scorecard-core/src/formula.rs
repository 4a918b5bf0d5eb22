//! Formula synthesis
//!
//! Scoring formulas are built as a small expression tree ([`Expr`]) and
//! rendered to text afterwards. The tree only knows logical addresses; the
//! [`RefFormatter`] handed to [`render`] decides how they are spelled.
//!
//! Two dialects share one scoring rule:
//!
//! * an answer of `"Not sure"` scores 0.5, whatever score is stored for it;
//! * any other answer scores the value paired with its label in the
//!   question's scored region;
//! * an answer missing from the scored region (including no answer) yields
//!   `""`, which the section average skips.
//!
//! [`WorkbookDialect`] looks the answer up in a two-column table with
//! `VLOOKUP`. [`ScriptDialect`] finds the answer's rank with `MATCH` and
//! reads the score stored at that rank with `INDEX`. For every valid answer
//! both return the same number.

use crate::address::{A1Style, CellRef, RangeRef, RefFormatter};
use crate::error::Result;
use crate::model::{Question, NOT_SURE, NOT_SURE_SCORE};
use crate::registry::AddressRegistry;

/// Number of complexity bands a section score falls into
pub const BAND_COUNT: u32 = 5;

/// Decimals `mean * 5` is rounded to before flooring
pub const BAND_ROUNDING_DIGITS: u32 = 9;

/// Spreadsheet functions the synthesizer emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    If,
    IfError,
    IsBlank,
    VLookup,
    Match,
    Index,
    Average,
    Int,
    Round,
    Min,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::If => "IF",
            Function::IfError => "IFERROR",
            Function::IsBlank => "ISBLANK",
            Function::VLookup => "VLOOKUP",
            Function::Match => "MATCH",
            Function::Index => "INDEX",
            Function::Average => "AVERAGE",
            Function::Int => "INT",
            Function::Round => "ROUND",
            Function::Min => "MIN",
        }
    }
}

/// Formula expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Cell(CellRef),
    Range(RangeRef),
    Call(Function, Vec<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    /// Inline array literal, `{a,b,c}`
    Array(Vec<Expr>),
}

impl Expr {
    pub fn text(s: impl Into<String>) -> Self {
        Expr::Text(s.into())
    }

    /// The empty string, the "no contribution" value
    pub fn blank() -> Self {
        Expr::Text(String::new())
    }

    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Expr::Call(function, args)
    }

    pub fn equals(self, other: Expr) -> Self {
        Expr::Eq(Box::new(self), Box::new(other))
    }

    pub fn plus(self, other: Expr) -> Self {
        Expr::Add(Box::new(self), Box::new(other))
    }

    pub fn times(self, other: Expr) -> Self {
        Expr::Mul(Box::new(self), Box::new(other))
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Eq(..) => 1,
            Expr::Add(..) => 2,
            Expr::Mul(..) => 3,
            _ => 4,
        }
    }
}

/// Render an expression without the leading `=`
pub fn render(expr: &Expr, fmt: &dyn RefFormatter) -> String {
    let mut out = String::new();
    render_into(&mut out, expr, fmt);
    out
}

fn render_into(out: &mut String, expr: &Expr, fmt: &dyn RefFormatter) {
    match expr {
        Expr::Number(n) => out.push_str(&format_number(*n)),
        Expr::Text(s) => {
            out.push('"');
            out.push_str(&s.replace('"', "\"\""));
            out.push('"');
        }
        Expr::Bool(b) => out.push_str(if *b { "TRUE" } else { "FALSE" }),
        Expr::Cell(cell) => out.push_str(&fmt.cell(cell)),
        Expr::Range(range) => out.push_str(&fmt.range(range)),
        Expr::Call(function, args) => {
            out.push_str(function.name());
            out.push('(');
            render_list(out, args, fmt);
            out.push(')');
        }
        Expr::Array(items) => {
            out.push('{');
            render_list(out, items, fmt);
            out.push('}');
        }
        Expr::Eq(lhs, rhs) => render_binary(out, expr, lhs, "=", rhs, fmt),
        Expr::Add(lhs, rhs) => render_binary(out, expr, lhs, "+", rhs, fmt),
        Expr::Mul(lhs, rhs) => render_binary(out, expr, lhs, "*", rhs, fmt),
    }
}

fn render_list(out: &mut String, items: &[Expr], fmt: &dyn RefFormatter) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        render_into(out, item, fmt);
    }
}

fn render_binary(
    out: &mut String,
    parent: &Expr,
    lhs: &Expr,
    op: &str,
    rhs: &Expr,
    fmt: &dyn RefFormatter,
) {
    // Left-associative: the right operand needs parens at equal precedence
    let wrap = |out: &mut String, child: &Expr, strict: bool| {
        let needs = if strict {
            child.precedence() <= parent.precedence()
        } else {
            child.precedence() < parent.precedence()
        };
        if needs {
            out.push('(');
            render_into(out, child, fmt);
            out.push(')');
        } else {
            render_into(out, child, fmt);
        }
    };
    wrap(out, lhs, false);
    out.push_str(op);
    wrap(out, rhs, true);
}

/// Shortest text that reads back as the same number
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// The per-question scores a section average runs over
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreTerms {
    /// Cells already holding one question score each
    Cells(RangeRef),
    /// Question score expressions spliced into an array literal
    Inline(Vec<Expr>),
}

impl ScoreTerms {
    pub fn is_empty(&self) -> bool {
        matches!(self, ScoreTerms::Inline(items) if items.is_empty())
    }
}

/// `IFERROR(MIN(5,INT(ROUND(AVERAGE(terms)*5,9))+1),"")`, or `""` with no terms
///
/// `floor(mean * 5) + 1` puts a mean of 0.6 in band 4; the `MIN` keeps a
/// mean of exactly 1.0 in band 5. Both engines floor the raw double, so the
/// product is rounded first: seven answers of 0.4 average to
/// 0.39999999999999997, which would otherwise drop to band 2.
pub fn section_aggregate(terms: ScoreTerms) -> Expr {
    let terms = match terms {
        ScoreTerms::Cells(range) => Expr::Range(range),
        ScoreTerms::Inline(items) if items.is_empty() => return Expr::blank(),
        ScoreTerms::Inline(items) => Expr::Array(items),
    };
    let bands = f64::from(BAND_COUNT);

    let scaled = Expr::call(Function::Average, vec![terms]).times(Expr::Number(bands));
    let band = Expr::call(
        Function::Int,
        vec![Expr::call(
            Function::Round,
            vec![scaled, Expr::Number(f64::from(BAND_ROUNDING_DIGITS))],
        )],
    )
    .plus(Expr::Number(1.0));

    Expr::call(
        Function::IfError,
        vec![
            Expr::call(Function::Min, vec![Expr::Number(bands), band]),
            Expr::blank(),
        ],
    )
}

/// One target grammar for scoring formulas
pub trait ScoringDialect {
    /// Reference style used to render this dialect
    fn formatter(&self) -> A1Style;

    /// The lookup of `answer`'s stored score, `""` on a miss
    fn lookup(&self, answer: Expr, question: &Question, registry: &AddressRegistry)
        -> Result<Expr>;

    /// The cell holding the answer this dialect scores
    fn answer_cell(&self, question: &Question, registry: &AddressRegistry) -> Result<CellRef> {
        Ok(registry.answer_slot_of(&question.id)?.clone())
    }

    /// Score expression for one question, `None` for questions without options
    fn question_score(
        &self,
        question: &Question,
        registry: &AddressRegistry,
    ) -> Result<Option<Expr>> {
        if !question.is_scored() {
            return Ok(None);
        }

        let answer = Expr::Cell(self.answer_cell(question, registry)?);
        let score = Expr::call(
            Function::If,
            vec![
                answer.clone().equals(Expr::text(NOT_SURE)),
                Expr::Number(NOT_SURE_SCORE),
                self.lookup(answer, question, registry)?,
            ],
        );
        Ok(Some(score))
    }

    /// Rendered score formula (with leading `=`) for one question
    fn question_score_formula(
        &self,
        question: &Question,
        registry: &AddressRegistry,
    ) -> Result<Option<String>> {
        Ok(self
            .question_score(question, registry)?
            .map(|expr| self.render_formula(&expr)))
    }

    /// Rendered section aggregate (with leading `=`)
    fn section_aggregate_formula(&self, terms: ScoreTerms) -> String {
        self.render_formula(&section_aggregate(terms))
    }

    fn render_formula(&self, expr: &Expr) -> String {
        format!("={}", render(expr, &self.formatter()))
    }
}

/// Workbook grammar: `VLOOKUP` over the question's label/score pair table
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookDialect;

impl ScoringDialect for WorkbookDialect {
    fn formatter(&self) -> A1Style {
        A1Style::WORKBOOK
    }

    fn lookup(
        &self,
        answer: Expr,
        question: &Question,
        registry: &AddressRegistry,
    ) -> Result<Expr> {
        let scored = registry.scored_region_of(&question.id)?;
        let lookup = match scored.as_pair_table() {
            Some(table) => Expr::call(
                Function::VLookup,
                vec![answer, Expr::Range(table), Expr::Number(2.0), Expr::Bool(false)],
            ),
            None => rank_lookup(answer, &scored.labels, &scored.scores),
        };
        Ok(Expr::call(Function::IfError, vec![lookup, Expr::blank()]))
    }
}

/// Response-sheet grammar: rank of the answer in the question's reference
/// column, then the score stored at that rank
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptDialect {
    /// Rows below the first response row
    pub response_row_offset: u32,
}

impl ScriptDialect {
    pub fn new(response_row_offset: u32) -> Self {
        Self {
            response_row_offset,
        }
    }
}

impl ScoringDialect for ScriptDialect {
    fn formatter(&self) -> A1Style {
        A1Style::SCRIPT
    }

    fn answer_cell(&self, question: &Question, registry: &AddressRegistry) -> Result<CellRef> {
        Ok(registry
            .answer_slot_of(&question.id)?
            .offset_rows(self.response_row_offset))
    }

    fn lookup(
        &self,
        answer: Expr,
        question: &Question,
        registry: &AddressRegistry,
    ) -> Result<Expr> {
        let scored = registry.scored_region_of(&question.id)?;
        Ok(Expr::call(
            Function::IfError,
            vec![
                rank_lookup(answer, &scored.labels, &scored.scores),
                Expr::blank(),
            ],
        ))
    }

    fn question_score(
        &self,
        question: &Question,
        registry: &AddressRegistry,
    ) -> Result<Option<Expr>> {
        if !question.is_scored() {
            return Ok(None);
        }

        let answer = Expr::Cell(self.answer_cell(question, registry)?);
        let scored = Expr::call(
            Function::If,
            vec![
                answer.clone().equals(Expr::text(NOT_SURE)),
                Expr::Number(NOT_SURE_SCORE),
                self.lookup(answer.clone(), question, registry)?,
            ],
        );
        // Unsubmitted response rows stay blank instead of matching nothing
        Ok(Some(Expr::call(
            Function::If,
            vec![
                Expr::call(Function::IsBlank, vec![answer]),
                Expr::blank(),
                scored,
            ],
        )))
    }
}

/// `INDEX(scores,MATCH(answer,labels,0))`
fn rank_lookup(answer: Expr, labels: &RangeRef, scores: &RangeRef) -> Expr {
    Expr::call(
        Function::Index,
        vec![
            Expr::Range(scores.clone()),
            Expr::call(
                Function::Match,
                vec![answer, Expr::Range(labels.clone()), Expr::Number(0.0)],
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;
    use crate::registry::ScoredRegion;
    use pretty_assertions::assert_eq;

    fn question() -> Question {
        Question::new("1.1", "How many sources?", QuestionType::SingleSelect)
            .with_option("Low", 0.0)
            .with_option("High", 1.0)
            .with_option(NOT_SURE, 0.0)
    }

    fn workbook_registry() -> AddressRegistry {
        let mut registry = AddressRegistry::new();
        registry
            .record_scored_region(
                "1.1",
                ScoredRegion::new(
                    RangeRef::new("_data", 9, 2, 3, 1),
                    RangeRef::new("_data", 9, 3, 3, 1),
                ),
            )
            .unwrap();
        registry
            .record_answer_slot("1.1", CellRef::new("Questions", 6, 3))
            .unwrap();
        registry
    }

    fn script_registry() -> AddressRegistry {
        let mut registry = AddressRegistry::new();
        registry
            .record_scored_region(
                "1.1",
                ScoredRegion::new(
                    RangeRef::new("_reference", 6, 3, 3, 1),
                    RangeRef::new("_reference", 10, 3, 3, 1),
                ),
            )
            .unwrap();
        registry
            .record_answer_slot("1.1", CellRef::new("Form Responses 1", 2, 3))
            .unwrap();
        registry
    }

    #[test]
    fn test_workbook_question_formula() {
        let formula = WorkbookDialect
            .question_score_formula(&question(), &workbook_registry())
            .unwrap()
            .unwrap();
        assert_eq!(
            formula,
            r#"=IF(Questions!$C$6="Not sure",0.5,IFERROR(VLOOKUP(Questions!$C$6,_data!$B$9:$C$11,2,FALSE),""))"#
        );
    }

    #[test]
    fn test_script_question_formula() {
        let formula = ScriptDialect::new(0)
            .question_score_formula(&question(), &script_registry())
            .unwrap()
            .unwrap();
        assert_eq!(
            formula,
            r#"=IF(ISBLANK('Form Responses 1'!C2),"",IF('Form Responses 1'!C2="Not sure",0.5,IFERROR(INDEX('_reference'!$C$10:$C$12,MATCH('Form Responses 1'!C2,'_reference'!$C$6:$C$8,0)),"")))"#
        );
    }

    #[test]
    fn test_script_response_row_offset() {
        let formula = ScriptDialect::new(3)
            .question_score_formula(&question(), &script_registry())
            .unwrap()
            .unwrap();
        assert!(formula.contains("'Form Responses 1'!C5"));
        assert!(!formula.contains("'Form Responses 1'!C2"));
    }

    #[test]
    fn test_free_text_has_no_term() {
        let q = Question::new("0.1", "Name", QuestionType::FreeText);
        assert_eq!(
            WorkbookDialect
                .question_score(&q, &AddressRegistry::new())
                .unwrap(),
            None
        );
        assert_eq!(
            ScriptDialect::new(0)
                .question_score(&q, &AddressRegistry::new())
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_unregistered_question_fails() {
        assert!(WorkbookDialect
            .question_score(&question(), &AddressRegistry::new())
            .is_err());
    }

    #[test]
    fn test_workbook_falls_back_to_rank_lookup() {
        // Score column not adjacent to the labels
        let formula = WorkbookDialect
            .question_score_formula(&question(), &script_registry())
            .unwrap()
            .unwrap();
        assert!(formula.contains("INDEX('_reference'!$C$10:$C$12,MATCH("));
        assert!(!formula.contains("VLOOKUP"));
    }

    #[test]
    fn test_section_aggregate() {
        let cells = ScoreTerms::Cells(RangeRef::new("Score", 2, 3, 1, 2));
        assert_eq!(
            WorkbookDialect.section_aggregate_formula(cells),
            r#"=IFERROR(MIN(5,INT(ROUND(AVERAGE(Score!$C$2:$D$2)*5,9))+1),"")"#
        );

        let inline = ScoreTerms::Inline(vec![Expr::Number(1.0), Expr::Number(0.5)]);
        assert_eq!(
            ScriptDialect::new(0).section_aggregate_formula(inline),
            r#"=IFERROR(MIN(5,INT(ROUND(AVERAGE({1,0.5})*5,9))+1),"")"#
        );
    }

    #[test]
    fn test_empty_section_aggregate() {
        let empty = ScoreTerms::Inline(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(section_aggregate(empty), Expr::blank());
        assert_eq!(
            ScriptDialect::new(0).section_aggregate_formula(ScoreTerms::Inline(Vec::new())),
            r#"="""#
        );
    }

    #[test]
    fn test_render_precedence() {
        let fmt = A1Style::WORKBOOK;
        let sum = Expr::Number(1.0).plus(Expr::Number(2.0));
        assert_eq!(render(&sum.clone().times(Expr::Number(3.0)), &fmt), "(1+2)*3");
        assert_eq!(
            render(&Expr::Number(3.0).times(Expr::Number(2.0)).plus(Expr::Number(1.0)), &fmt),
            "3*2+1"
        );
        assert_eq!(
            render(&Expr::Number(1.0).plus(sum), &fmt),
            "1+(1+2)"
        );
    }

    #[test]
    fn test_render_literals() {
        let fmt = A1Style::WORKBOOK;
        assert_eq!(render(&Expr::text(r#"say "hi""#), &fmt), r#""say ""hi""""#);
        assert_eq!(render(&Expr::Bool(true), &fmt), "TRUE");
        assert_eq!(format_number(0.333), "0.333");
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(-0.5), "-0.5");
    }
}
