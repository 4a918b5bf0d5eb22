//! Questionnaire rules
//!
//! Checks a parsed document before it becomes an assessment. Every problem
//! is collected; an empty list means the document is valid.

use scorecard_core::{is_not_sure_label, QuestionType, NOT_SURE};
use tracing::warn;

use crate::input::{RawDocument, RawQuestion};

/// Title of the section that identifies the data product
pub const IDENTIFICATION_SECTION: &str = "Data Product Information";

/// Check `document`, returning one message per problem
pub fn validate(document: &RawDocument) -> Vec<String> {
    let mut problems = Vec::new();
    let sections = &document.data_product_complexity.sections;

    if sections.is_empty() {
        problems.push("At least one section is required.".to_string());
    }
    if !sections.iter().any(|s| s.section == IDENTIFICATION_SECTION) {
        problems.push(format!(
            "Missing required section: '{}'.",
            IDENTIFICATION_SECTION
        ));
    }

    for (index, section) in sections.iter().enumerate() {
        // The first section holds free-form metadata and is never scored
        let scored = index > 0;
        for question in &section.questions {
            check_question(question, scored, &mut problems);
        }
    }

    for problem in &problems {
        warn!("{}", problem);
    }
    problems
}

fn check_question(question: &RawQuestion, scored: bool, problems: &mut Vec<String>) {
    let name = &question.question;
    let labels: Vec<&str> = question.options().iter().map(|o| o.text()).collect();

    match question.question_type {
        QuestionType::FreeText => {
            if question.options.is_some() {
                problems.push(format!(
                    "'options' should not be present for ShortAnswer in question '{}'.",
                    name
                ));
            }
        }
        QuestionType::SingleSelect | QuestionType::MultiSelect => {
            if labels.is_empty() {
                problems.push(format!(
                    "'options' must be a non-empty list for {} in question '{}'.",
                    type_name(question.question_type),
                    name
                ));
            }
        }
    }

    if scored && question.question_type == QuestionType::SingleSelect && !labels.is_empty() {
        if !labels.last().is_some_and(|l| is_not_sure_label(l)) {
            problems.push(format!(
                "The last option for DropDown question '{}' must be '{}'.",
                name, NOT_SURE
            ));
        }
        let early = labels[..labels.len() - 1]
            .iter()
            .any(|l| is_not_sure_label(l));
        if early {
            problems.push(format!(
                "'{}' may only be the last option of DropDown question '{}'.",
                NOT_SURE, name
            ));
        }
    }

    // Lookups in both spreadsheet dialects match labels ignoring case
    for (i, label) in labels.iter().enumerate() {
        if labels[..i].iter().any(|l| l.eq_ignore_ascii_case(label)) {
            problems.push(format!(
                "Option '{}' appears more than once in question '{}'.",
                label, name
            ));
        }
    }

    for option in question.options() {
        if let Some(score) = option.score() {
            if !(0.0..=1.0).contains(&score) {
                problems.push(format!(
                    "Score {} of option '{}' in question '{}' is outside [0, 1].",
                    score,
                    option.text(),
                    name
                ));
            }
        }
    }

    if let Some(weight) = question.weight {
        if !weight.is_finite() || weight < 0.0 {
            problems.push(format!(
                "Weight {} of question '{}' must be a non-negative number.",
                weight, name
            ));
        }
    }
}

fn type_name(kind: QuestionType) -> &'static str {
    match kind {
        QuestionType::SingleSelect => "DropDown",
        QuestionType::MultiSelect => "CheckBox",
        QuestionType::FreeText => "ShortAnswer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn problems(yaml_sections: &str) -> Vec<String> {
        let yaml = format!(
            "data_product_complexity:\n  formTitle: T\n  sections:\n{}",
            yaml_sections
        );
        validate(&RawDocument::parse(&yaml).unwrap())
    }

    const INFO: &str = r#"
    - section: Data Product Information
      questions:
        - question: Owner
          questionType: DropDown
          options: [Team A, Team B]
"#;

    #[test]
    fn test_valid_document() {
        let sections = format!(
            "{INFO}{}",
            r#"
    - section: Sources
      questions:
        - question: How many?
          questionType: DropDown
          options: [One, Many, Not sure]
        - question: Notes
          questionType: ShortAnswer
"#
        );
        assert_eq!(problems(&sections), Vec::<String>::new());
    }

    #[test]
    fn test_collects_every_problem() {
        let sections = r#"
    - section: About
    - section: Sources
      questions:
        - question: Notes
          questionType: ShortAnswer
          options: [A]
        - question: Formats
          questionType: CheckBox
          options: []
        - question: How many?
          questionType: DropDown
          weight: -1
          options:
            - optionText: Not sure
              score: 0.5
            - optionText: One
              score: 1.5
            - optionText: One
              score: 0.2
"#;
        assert_eq!(
            problems(sections),
            vec![
                "Missing required section: 'Data Product Information'.",
                "'options' should not be present for ShortAnswer in question 'Notes'.",
                "'options' must be a non-empty list for CheckBox in question 'Formats'.",
                "The last option for DropDown question 'How many?' must be 'Not sure'.",
                "'Not sure' may only be the last option of DropDown question 'How many?'.",
                "Option 'One' appears more than once in question 'How many?'.",
                "Score 1.5 of option 'One' in question 'How many?' is outside [0, 1].",
                "Weight -1 of question 'How many?' must be a non-negative number.",
            ]
        );
    }

    #[test]
    fn test_labels_compare_ignoring_case() {
        let duplicate = format!(
            "{INFO}{}",
            r#"
    - section: Sources
      questions:
        - question: Q
          questionType: DropDown
          options: [High, high, Not sure]
"#
        );
        assert_eq!(
            problems(&duplicate),
            vec!["Option 'high' appears more than once in question 'Q'."]
        );

        let lower_sentinel = format!(
            "{INFO}{}",
            r#"
    - section: Sources
      questions:
        - question: Q
          questionType: DropDown
          options: [Low, High, not sure]
"#
        );
        assert_eq!(problems(&lower_sentinel), Vec::<String>::new());

        let early_sentinel = format!(
            "{INFO}{}",
            r#"
    - section: Sources
      questions:
        - question: Q
          questionType: DropDown
          options: [NOT SURE, Low, Not sure]
"#
        );
        assert_eq!(
            problems(&early_sentinel),
            vec![
                "'Not sure' may only be the last option of DropDown question 'Q'.",
                "Option 'Not sure' appears more than once in question 'Q'.",
            ]
        );
    }

    #[test]
    fn test_identification_section_is_exempt() {
        // No trailing "Not sure" in the first section
        assert_eq!(problems(INFO), Vec::<String>::new());
    }

    #[test]
    fn test_no_sections() {
        let document =
            RawDocument::parse("data_product_complexity:\n  formTitle: T\n  sections: []\n").unwrap();
        assert_eq!(
            validate(&document),
            vec![
                "At least one section is required.",
                "Missing required section: 'Data Product Information'.",
            ]
        );
    }
}
