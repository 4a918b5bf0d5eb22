//! Assessment model
//!
//! The validated questionnaire: one identification section followed by the
//! scorable sections. Built once and only read afterwards.

use serde::{Deserialize, Serialize};

/// Text of the sentinel option that always scores [`NOT_SURE_SCORE`]
pub const NOT_SURE: &str = "Not sure";

/// Normalized score of the [`NOT_SURE`] sentinel
pub const NOT_SURE_SCORE: f64 = 0.5;

/// Whether `text` names the sentinel
///
/// Spreadsheet comparisons ignore case, so any casing of "not sure" is the
/// sentinel.
pub fn is_not_sure_label(text: &str) -> bool {
    text.eq_ignore_ascii_case(NOT_SURE)
}

/// Id given to the identification section
pub const IDENTIFICATION_SECTION_ID: &str = "0";

/// How a question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// Pick exactly one option
    #[serde(rename = "DropDown")]
    SingleSelect,
    /// Pick any number of options
    #[serde(rename = "CheckBox")]
    MultiSelect,
    /// Type a short free-form answer
    #[serde(rename = "ShortAnswer")]
    FreeText,
}

impl QuestionType {
    /// Whether questions of this type carry an option list
    pub fn has_options(self) -> bool {
        !matches!(self, QuestionType::FreeText)
    }
}

/// One selectable answer and its normalized score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    #[serde(rename = "optionText")]
    pub text: String,
    /// Score in `[0, 1]`. Kept for the sentinel too, but never read for it.
    pub score: f64,
}

impl AnswerOption {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }

    /// Whether this is the "Not sure" sentinel
    pub fn is_not_sure(&self) -> bool {
        is_not_sure_label(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Hierarchical id, `"{section}.{n}"`
    pub id: String,
    #[serde(rename = "question")]
    pub text: String,
    pub description: String,
    /// Reserved for weighted aggregation; sections currently average unweighted
    pub weight: f64,
    #[serde(rename = "questionType")]
    pub kind: QuestionType,
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn new(id: impl Into<String>, text: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            description: String::new(),
            weight: 1.0,
            kind,
            options: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_option(mut self, text: impl Into<String>, score: f64) -> Self {
        self.options.push(AnswerOption::new(text, score));
        self
    }

    /// Number of options, the sentinel included
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Whether this question produces a score term
    pub fn is_scored(&self) -> bool {
        !self.options.is_empty()
    }

    /// The sentinel option, if offered
    pub fn not_sure_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_not_sure())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(rename = "section")]
    pub title: String,
    pub questions: Vec<Question>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            questions: Vec::new(),
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    /// Questions that contribute a score term
    pub fn scored_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_scored())
    }
}

/// The full questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    #[serde(rename = "formTitle")]
    pub title: String,
    pub identification: Section,
    pub scorable: Vec<Section>,
}

impl Assessment {
    pub fn new(title: impl Into<String>, identification: Section, scorable: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            identification,
            scorable,
        }
    }

    /// All sections in document order, identification first
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        std::iter::once(&self.identification).chain(self.scorable.iter())
    }

    /// All questions in document order
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections().flat_map(|s| s.questions.iter())
    }

    /// Total number of questions across every section
    pub fn question_count(&self) -> usize {
        self.sections().map(|s| s.questions.len()).sum()
    }

    /// Largest option list of any question
    pub fn max_option_count(&self) -> usize {
        self.questions().map(Question::option_count).max().unwrap_or(0)
    }

    /// Find a question by id
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions().find(|q| q.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Assessment {
        let info = Section::new("0", "Data Product Information")
            .with_question(Question::new("0.1", "Name", QuestionType::FreeText));
        let scored = Section::new("1", "Data Sources")
            .with_question(
                Question::new("1.1", "How many sources?", QuestionType::SingleSelect)
                    .with_option("One", 0.0)
                    .with_option("Many", 1.0)
                    .with_option(NOT_SURE, 0.0),
            )
            .with_question(Question::new("1.2", "Notes", QuestionType::FreeText));
        Assessment::new("Complexity", info, vec![scored])
    }

    #[test]
    fn test_document_order() {
        let assessment = sample();
        let ids: Vec<_> = assessment.questions().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["0.1", "1.1", "1.2"]);
        assert_eq!(assessment.question_count(), 3);
        assert_eq!(assessment.max_option_count(), 3);
    }

    #[test]
    fn test_sentinel_keeps_stored_score() {
        let assessment = sample();
        let q = assessment.question("1.1").unwrap();
        assert_eq!(q.not_sure_option().unwrap().score, 0.0);
        assert!(assessment.question("1.2").unwrap().not_sure_option().is_none());
    }

    #[test]
    fn test_sentinel_ignores_case() {
        assert!(is_not_sure_label("Not sure"));
        assert!(is_not_sure_label("NOT SURE"));
        assert!(is_not_sure_label("not sure"));
        assert!(!is_not_sure_label("Not sure yet"));

        let q = Question::new("1.1", "Q", QuestionType::SingleSelect)
            .with_option("Low", 0.0)
            .with_option("not sure", 0.5);
        assert_eq!(q.not_sure_option().unwrap().text, "not sure");
    }

    #[test]
    fn test_scored_questions_skip_free_text() {
        let assessment = sample();
        let scored: Vec<_> = assessment.scorable[0]
            .scored_questions()
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(scored, vec!["1.1"]);
    }
}
