//! Rank-score normalizer
//!
//! Turns bare option lists into scored ones. The k-th of N ordinary options
//! scores `k / N` rounded to three decimals; "Not sure" (any case) scores
//! 0.5. Options that already carry a score keep it but still count towards
//! N and the ranks of the others.

use scorecard_core::{is_not_sure_label, AnswerOption, NOT_SURE_SCORE};

use crate::error::Result;
use crate::input::{RawDocument, RawOption};

/// `rank / total` rounded to three decimals
fn rank_score(rank: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (rank as f64 / total as f64 * 1000.0).round() / 1000.0
}

/// Scores for a raw option list, in option order
pub fn scored_options(options: &[RawOption]) -> Vec<AnswerOption> {
    let total = options.iter().filter(|o| !is_not_sure_label(o.text())).count();
    let mut rank = 0;

    options
        .iter()
        .map(|option| {
            let text = option.text();
            if is_not_sure_label(text) {
                return AnswerOption::new(text, option.score().unwrap_or(NOT_SURE_SCORE));
            }
            rank += 1;
            let score = option.score().unwrap_or_else(|| rank_score(rank, total));
            AnswerOption::new(text, score)
        })
        .collect()
}

/// Give every option an explicit score and every question a weight
pub fn normalize(document: &mut RawDocument) {
    for section in &mut document.data_product_complexity.sections {
        for question in &mut section.questions {
            question.weight.get_or_insert(1.0);
            if let Some(options) = question.options.as_mut() {
                *options = scored_options(options)
                    .into_iter()
                    .map(|o| RawOption::Scored {
                        option_text: o.text,
                        score: o.score,
                    })
                    .collect();
            }
        }
    }
}

/// Normalize and render the document back to YAML
pub fn normalize_to_yaml(mut document: RawDocument) -> Result<String> {
    normalize(&mut document);
    Ok(serde_yml::to_string(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scorecard_core::NOT_SURE;

    fn texts(labels: &[&str]) -> Vec<RawOption> {
        labels.iter().map(|l| RawOption::Text(l.to_string())).collect()
    }

    #[test]
    fn test_rank_scores() {
        let scored = scored_options(&texts(&["Low", "Medium", "High", "not sure"]));
        let pairs: Vec<_> = scored.iter().map(|o| (o.text.as_str(), o.score)).collect();
        assert_eq!(
            pairs,
            vec![("Low", 0.333), ("Medium", 0.667), ("High", 1.0), ("not sure", 0.5)]
        );
    }

    #[test]
    fn test_explicit_scores_are_kept() {
        let options = vec![
            RawOption::Text("A".into()),
            RawOption::Scored {
                option_text: "B".into(),
                score: 0.1,
            },
            RawOption::Text("C".into()),
            RawOption::Text("D".into()),
        ];
        let scores: Vec<_> = scored_options(&options).iter().map(|o| o.score).collect();
        assert_eq!(scores, vec![0.25, 0.1, 0.75, 1.0]);
    }

    #[test]
    fn test_only_not_sure() {
        let scored = scored_options(&texts(&[NOT_SURE]));
        assert_eq!(scored[0].score, 0.5);
    }

    #[test]
    fn test_normalize_to_yaml() {
        let yaml = r#"
data_product_complexity:
  formTitle: T
  sections:
    - section: Data Product Information
      questions:
        - question: Name
          description: ""
          questionType: ShortAnswer
    - section: Sources
      questions:
        - question: How many?
          description: ""
          questionType: DropDown
          options: [One, Two, Not sure]
"#;
        let out = normalize_to_yaml(RawDocument::parse(yaml).unwrap()).unwrap();
        let document = RawDocument::parse(&out).unwrap();

        let sections = &document.data_product_complexity.sections;
        assert_eq!(sections[0].questions[0].weight, Some(1.0));
        assert_eq!(sections[0].questions[0].options, None);
        assert_eq!(
            sections[1].questions[0].options(),
            &[
                RawOption::Scored {
                    option_text: "One".into(),
                    score: 0.5
                },
                RawOption::Scored {
                    option_text: "Two".into(),
                    score: 1.0
                },
                RawOption::Scored {
                    option_text: "Not sure".into(),
                    score: 0.5
                },
            ]
        );
    }
}
