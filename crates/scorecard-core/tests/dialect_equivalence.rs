//! The workbook and script dialects must score every answer identically.

mod common;

use common::{dropdown, identification, low_medium_high, two_question_assessment, Evaluator, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use scorecard_core::{
    Assessment, CellContent, CellRef, Expr, LayoutBuilder, LayoutStyle, MemoryGrid, RangeRef,
    ScoreTerms, ScoringDialect, ScriptDialect, Section, WorkbookDialect, NOT_SURE,
};

/// One laid-out backend with answers filled in
struct Backend {
    grid: MemoryGrid,
    layout: scorecard_core::Layout,
    style: LayoutStyle,
}

impl Backend {
    fn new(assessment: &Assessment, style: LayoutStyle) -> Self {
        let mut grid = MemoryGrid::new();
        let layout = LayoutBuilder::new(style)
            .layout(assessment, &mut grid)
            .unwrap();
        Self {
            grid,
            layout,
            style,
        }
    }

    fn answer(&mut self, question: &str, text: &str) {
        let slot = self.layout.registry.answer_slot_of(question).unwrap().clone();
        self.grid.set(&slot, CellContent::from(text));
    }

    fn dialect(&self) -> Box<dyn ScoringDialect> {
        match self.style {
            LayoutStyle::Workbook => Box::new(WorkbookDialect),
            LayoutStyle::ResponseTable => Box::new(ScriptDialect::new(0)),
        }
    }

    fn score(&self, assessment: &Assessment, question: &str) -> Value {
        let question = assessment.question(question).unwrap();
        let expr = self
            .dialect()
            .question_score(question, &self.layout.registry)
            .unwrap()
            .unwrap();
        Evaluator::new(&self.grid).eval(&expr)
    }

    fn section_band(&self, section: &Section) -> Value {
        let dialect = self.dialect();
        let terms: Vec<Expr> = section
            .scored_questions()
            .map(|q| {
                dialect
                    .question_score(q, &self.layout.registry)
                    .unwrap()
                    .unwrap()
            })
            .collect();

        match self.style {
            // Workbook: terms live in hidden cells, the aggregate averages the range
            LayoutStyle::Workbook => {
                let row = 2;
                let evaluator = terms.iter().enumerate().fold(
                    Evaluator::new(&self.grid),
                    |ev, (i, term)| {
                        ev.with_formula(CellRef::new("Score", row, 3 + i as u32), term.clone())
                    },
                );
                if terms.is_empty() {
                    return evaluator.eval(&scorecard_core::section_aggregate(
                        ScoreTerms::Inline(Vec::new()),
                    ));
                }
                let range = RangeRef::new("Score", row, 3, 1, terms.len() as u32);
                evaluator.eval(&scorecard_core::section_aggregate(ScoreTerms::Cells(range)))
            }
            LayoutStyle::ResponseTable => Evaluator::new(&self.grid)
                .eval(&scorecard_core::section_aggregate(ScoreTerms::Inline(terms))),
        }
    }
}

fn both(assessment: &Assessment) -> [Backend; 2] {
    [
        Backend::new(assessment, LayoutStyle::Workbook),
        Backend::new(assessment, LayoutStyle::ResponseTable),
    ]
}

#[test]
fn not_sure_scores_one_half_in_both_dialects() {
    let assessment = two_question_assessment();
    for mut backend in both(&assessment) {
        backend.answer("1.1", NOT_SURE);
        assert_eq!(
            backend.score(&assessment, "1.1"),
            Value::Number(0.5),
            "{:?}",
            backend.style
        );
    }
}

#[test]
fn not_sure_ignores_stored_score() {
    let assessment = Assessment::new(
        "t",
        identification(),
        vec![Section::new("1", "S").with_question(dropdown(
            "1.1",
            &[("A", 0.0), ("B", 1.0), (NOT_SURE, 0.9)],
        ))],
    );
    for mut backend in both(&assessment) {
        backend.answer("1.1", NOT_SURE);
        assert_eq!(backend.score(&assessment, "1.1"), Value::Number(0.5));
    }
}

#[test]
fn selected_option_yields_stored_score() {
    let assessment = two_question_assessment();
    for (label, expected) in [("Low", 0.0), ("Medium", 0.5), ("High", 1.0)] {
        for mut backend in both(&assessment) {
            backend.answer("1.2", label);
            assert_eq!(
                backend.score(&assessment, "1.2"),
                Value::Number(expected),
                "{label} in {:?}",
                backend.style
            );
        }
    }
}

#[test]
fn unanswered_and_unknown_answers_contribute_nothing() {
    let assessment = two_question_assessment();
    for mut backend in both(&assessment) {
        assert_eq!(backend.score(&assessment, "1.1"), Value::Text(String::new()));
        backend.answer("1.1", "Enormous");
        assert_eq!(backend.score(&assessment, "1.1"), Value::Text(String::new()));

        // Nothing answered anywhere: the section band is blank too
        let section = &assessment.scorable[0];
        let fresh = Backend::new(&assessment, backend.style);
        assert_eq!(
            fresh.section_band(section),
            Value::Text(String::new())
        );
    }
}

#[test]
fn partially_answered_section_averages_answered_terms() {
    let assessment = two_question_assessment();
    let section = &assessment.scorable[0];
    for mut backend in both(&assessment) {
        backend.answer("1.1", "High");
        // mean 1.0 -> clamped to band 5
        assert_eq!(
            backend.section_band(section),
            Value::Number(5.0)
        );
    }
}

#[test]
fn end_to_end_high_and_not_sure() {
    let assessment = two_question_assessment();
    let section = &assessment.scorable[0];
    for mut backend in both(&assessment) {
        backend.answer("1.1", "High");
        backend.answer("1.2", NOT_SURE);
        assert_eq!(backend.score(&assessment, "1.1"), Value::Number(1.0));
        assert_eq!(backend.score(&assessment, "1.2"), Value::Number(0.5));
        // mean 0.75 -> floor(3.75) + 1
        assert_eq!(
            backend.section_band(section),
            Value::Number(4.0),
            "{:?}",
            backend.style
        );
    }
}

#[test]
fn nine_questions_at_point_six_fall_in_band_four() {
    let section = (1..=9).fold(Section::new("1", "Consumers"), |s, n| {
        s.with_question(dropdown(
            &format!("1.{n}"),
            &[("Some", 0.2), ("Most", 0.6), ("All", 1.0), (NOT_SURE, 0.5)],
        ))
    });
    let assessment = Assessment::new("t", identification(), vec![section]);
    let section = &assessment.scorable[0];

    for mut backend in both(&assessment) {
        for n in 1..=9 {
            backend.answer(&format!("1.{n}"), "Most");
        }
        assert_eq!(
            backend.section_band(section),
            Value::Number(4.0),
            "{:?}",
            backend.style
        );
    }
}

#[test]
fn mean_just_below_a_band_boundary_keeps_its_band() {
    // Seven answers of 0.4 average to 0.39999999999999997 in f64
    let section = (1..=7).fold(Section::new("1", "Consumers"), |s, n| {
        s.with_question(dropdown(
            &format!("1.{n}"),
            &[("Few", 0.4), ("Many", 1.0), (NOT_SURE, 0.5)],
        ))
    });
    let assessment = Assessment::new("t", identification(), vec![section]);
    let section = &assessment.scorable[0];

    let mean = [0.4f64; 7].iter().sum::<f64>() / 7.0;
    assert_eq!((mean * 5.0).floor(), 1.0);

    for mut backend in both(&assessment) {
        for n in 1..=7 {
            backend.answer(&format!("1.{n}"), "Few");
        }
        assert_eq!(
            backend.section_band(section),
            Value::Number(3.0),
            "{:?}",
            backend.style
        );
    }
}

#[test]
fn section_without_scored_questions_aggregates_blank() {
    let assessment = Assessment::new(
        "t",
        identification(),
        vec![Section::new("1", "Notes").with_question(scorecard_core::Question::new(
            "1.1",
            "Anything else?",
            scorecard_core::QuestionType::FreeText,
        ))],
    );
    for backend in both(&assessment) {
        assert_eq!(
            backend.section_band(&assessment.scorable[0]),
            Value::Text(String::new())
        );
    }
}

#[test]
fn later_response_rows_are_scored_independently() {
    let assessment = two_question_assessment();
    let mut backend = Backend::new(&assessment, LayoutStyle::ResponseTable);
    let slot = backend.layout.registry.answer_slot_of("1.1").unwrap().clone();
    backend.answer("1.1", "Low");
    backend.grid.set(&slot.offset_rows(2), "High".into());

    let question = assessment.question("1.1").unwrap();
    let third = ScriptDialect::new(2)
        .question_score(question, &backend.layout.registry)
        .unwrap()
        .unwrap();
    let second = ScriptDialect::new(1)
        .question_score(question, &backend.layout.registry)
        .unwrap()
        .unwrap();
    let evaluator = Evaluator::new(&backend.grid);
    assert_eq!(evaluator.eval(&third), Value::Number(1.0));
    assert_eq!(evaluator.eval(&second), Value::Text(String::new()));
}

#[test]
fn multi_select_is_scored_like_single_select() {
    let mut question = low_medium_high("1.1");
    question.kind = scorecard_core::QuestionType::MultiSelect;
    let assessment = Assessment::new(
        "t",
        identification(),
        vec![Section::new("1", "S").with_question(question)],
    );
    for mut backend in both(&assessment) {
        backend.answer("1.1", "Medium");
        assert_eq!(backend.score(&assessment, "1.1"), Value::Number(0.5));
    }
}

fn scored_options() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((0u32..=1000).prop_map(|n| f64::from(n) / 1000.0), 1..8)
}

proptest! {
    #[test]
    fn dialects_agree_for_every_valid_answer(
        first in scored_options(),
        second in scored_options(),
        pick in 0usize..16,
    ) {
        let options = |prefix: &str, scores: &[f64]| -> Vec<(String, f64)> {
            scores
                .iter()
                .enumerate()
                .map(|(i, s)| (format!("{prefix} {i}"), *s))
                .chain(std::iter::once((NOT_SURE.to_string(), 0.0)))
                .collect()
        };
        let a = options("A", &first);
        let b = options("B", &second);
        fn as_refs(v: &[(String, f64)]) -> Vec<(&str, f64)> {
            v.iter().map(|(l, s)| (l.as_str(), *s)).collect()
        }

        let assessment = Assessment::new(
            "t",
            identification(),
            vec![
                Section::new("1", "Empty"),
                Section::new("2", "S")
                    .with_question(dropdown("2.1", &as_refs(&a)))
                    .with_question(dropdown("2.2", &as_refs(&b))),
            ],
        );

        let (label, _) = &b[pick % b.len()];
        let mut scores = Vec::new();
        for mut backend in both(&assessment) {
            backend.answer("2.2", label);
            scores.push(backend.score(&assessment, "2.2"));
        }
        prop_assert_eq!(&scores[0], &scores[1]);

        let expected = if label == NOT_SURE {
            0.5
        } else {
            b[pick % b.len()].1
        };
        prop_assert_eq!(&scores[0], &Value::Number(expected));
    }
}
