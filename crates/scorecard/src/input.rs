//! Questionnaire input
//!
//! The YAML document shape, and its conversion into an [`Assessment`]:
//!
//! ```yaml
//! data_product_complexity:
//!   formTitle: Data Product Complexity
//!   sections:
//!     - section: Data Product Information
//!       questions:
//!         - question: Data product name
//!           description: ""
//!           questionType: ShortAnswer
//!     - section: Data Sources
//!       questions:
//!         - question: How many sources feed the product?
//!           description: Count distinct upstream systems.
//!           questionType: DropDown
//!           options: [One, A few, Many, Not sure]
//! ```
//!
//! Options are plain strings (scored by rank on load) or
//! `{optionText, score}` maps.

use std::path::Path;

use scorecard_core::{
    Assessment, Question, QuestionType, Section, IDENTIFICATION_SECTION_ID,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::normalize::scored_options;
use crate::validate::validate;

/// Top-level YAML document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub data_product_complexity: RawQuestionnaire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestionnaire {
    pub form_title: String,
    #[serde(default)]
    pub sections: Vec<RawSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSection {
    pub section: String,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub question: String,
    #[serde(default)]
    pub description: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<RawOption>>,
}

/// An option as written: bare text, or text with an explicit score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOption {
    Text(String),
    Scored {
        #[serde(rename = "optionText")]
        option_text: String,
        score: f64,
    },
}

impl RawOption {
    pub fn text(&self) -> &str {
        match self {
            RawOption::Text(text) => text,
            RawOption::Scored { option_text, .. } => option_text,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            RawOption::Text(_) => None,
            RawOption::Scored { score, .. } => Some(*score),
        }
    }
}

impl RawQuestion {
    pub fn options(&self) -> &[RawOption] {
        self.options.as_deref().unwrap_or_default()
    }
}

impl RawDocument {
    /// Parse a YAML document without checking questionnaire rules
    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Build the assessment: the first section identifies the data product,
    /// the rest are scored
    ///
    /// Sections get ids `"0"`, `"1"`, ...; questions get `"{section}.{n}"`.
    pub fn to_assessment(&self) -> Result<Assessment> {
        let questionnaire = &self.data_product_complexity;
        let (first, rest) = questionnaire
            .sections
            .split_first()
            .ok_or_else(|| Error::Invalid(vec!["At least one section is required.".into()]))?;

        let identification = build_section(first, IDENTIFICATION_SECTION_ID);
        let scorable = rest
            .iter()
            .enumerate()
            .map(|(i, section)| build_section(section, &(i + 1).to_string()))
            .collect();

        Ok(Assessment::new(
            questionnaire.form_title.as_str(),
            identification,
            scorable,
        ))
    }
}

fn build_section(raw: &RawSection, id: &str) -> Section {
    raw.questions
        .iter()
        .enumerate()
        .fold(Section::new(id, raw.section.as_str()), |section, (n, q)| {
            section.with_question(build_question(q, &format!("{}.{}", id, n + 1)))
        })
}

fn build_question(raw: &RawQuestion, id: &str) -> Question {
    let mut question = Question::new(id, raw.question.as_str(), raw.question_type)
        .with_description(raw.description.as_str())
        .with_weight(raw.weight.unwrap_or(1.0));
    if raw.question_type != QuestionType::FreeText {
        question.options = scored_options(raw.options());
    }
    question
}

/// Parse, validate and build an assessment from YAML text
pub fn from_str(yaml: &str) -> Result<Assessment> {
    let document = RawDocument::parse(yaml)?;
    let problems = validate(&document);
    if !problems.is_empty() {
        return Err(Error::Invalid(problems));
    }
    let assessment = document.to_assessment()?;
    debug!(
        sections = assessment.scorable.len() + 1,
        questions = assessment.question_count(),
        "questionnaire loaded"
    );
    Ok(assessment)
}

/// Read a YAML document from disk without building the assessment
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<RawDocument> {
    let text = std::fs::read_to_string(path)?;
    RawDocument::parse(&text)
}

/// Parse, validate and build an assessment from a YAML file
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Assessment> {
    let text = std::fs::read_to_string(path)?;
    from_str(&text)
}
