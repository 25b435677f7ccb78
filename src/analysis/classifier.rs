//! Question classification.
//!
//! Partitions a survey's elements into choice-question groups keyed by
//! control type and option set, and into text questions.

use crate::models::{ControlType, Element, OptionSet};
use indexmap::IndexMap;
use tracing::debug;

/// A choice question awaiting tallying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceQuestion {
    /// Element id, the key into answer records.
    pub id: String,
    /// Display text.
    pub content: String,
}

/// Choice questions grouped by control type, then by option set.
///
/// Both levels keep first-seen order.
pub type ChoiceGroups = IndexMap<ControlType, IndexMap<OptionSet, Vec<ChoiceQuestion>>>;

/// Output of [`classify`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub choice_groups: ChoiceGroups,
    /// Text question id to display text, in first-seen order.
    pub text_questions: IndexMap<String, String>,
}

/// Classify survey elements.
///
/// Elements of other control types, elements without question data, and
/// choice elements without options are dropped.
pub fn classify(elements: &[Element]) -> Classification {
    let mut classification = Classification::default();

    for element in elements {
        let Some(data) = element.question() else {
            continue;
        };

        match &element.control_type {
            ControlType::SingleChoice | ControlType::MultipleChoice => {
                if data.options.is_empty() {
                    debug!("Skipping choice question {} without options", element.id);
                    continue;
                }

                classification
                    .choice_groups
                    .entry(element.control_type.clone())
                    .or_default()
                    .entry(OptionSet::new(data.options.clone()))
                    .or_default()
                    .push(ChoiceQuestion {
                        id: element.id.clone(),
                        content: data.content.clone(),
                    });
            }
            ControlType::TextAnswer => {
                classification
                    .text_questions
                    .insert(element.id.clone(), data.content.clone());
            }
            ControlType::Other(_) => {}
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionData;

    fn element(id: &str, control_type: &str, content: &str, options: &[&str]) -> Element {
        Element {
            id: id.to_string(),
            control_type: ControlType::from(control_type),
            question_data: Some(QuestionData {
                content: content.to_string(),
                options: options.iter().map(|o| o.to_string()).collect(),
            }),
        }
    }

    #[test]
    fn test_groups_by_type_and_option_set() {
        let elements = vec![
            element("q1", "single-choice", "Câu 1", &["Có", "Không"]),
            element("q2", "multiple-choice", "Câu 2", &["A", "B"]),
            element("q3", "single-choice", "Câu 3", &["Có", "Không"]),
            element("q4", "single-choice", "Câu 4", &["A", "B"]),
        ];

        let classification = classify(&elements);
        let types: Vec<_> = classification.choice_groups.keys().cloned().collect();
        assert_eq!(types, vec![ControlType::SingleChoice, ControlType::MultipleChoice]);

        let single = &classification.choice_groups[&ControlType::SingleChoice];
        assert_eq!(single.len(), 2);

        let yes_no: OptionSet = ["Có", "Không"].into_iter().collect();
        let ids: Vec<_> = single[&yes_no].iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q3"]);

        // First-seen group order
        let first_key = single.keys().next().unwrap();
        assert_eq!(first_key, &yes_no);
    }

    #[test]
    fn test_reordered_options_form_distinct_groups() {
        let elements = vec![
            element("q1", "single-choice", "Same", &["Yes", "No"]),
            element("q2", "single-choice", "Same", &["No", "Yes"]),
        ];

        let classification = classify(&elements);
        assert_eq!(classification.choice_groups[&ControlType::SingleChoice].len(), 2);
    }

    #[test]
    fn test_drops_empty_options_and_other_types() {
        let elements = vec![
            element("q1", "single-choice", "No options", &[]),
            element("h1", "html", "Heading", &[]),
            Element {
                id: "q2".to_string(),
                control_type: ControlType::MultipleChoice,
                question_data: None,
            },
        ];

        let classification = classify(&elements);
        assert!(classification.choice_groups.is_empty());
        assert!(classification.text_questions.is_empty());
    }

    #[test]
    fn test_collects_text_questions() {
        let elements = vec![
            element("t1", "text-answer", "Góp ý", &[]),
            element("t2", "text-answer", "Đề xuất", &[]),
            element("t1", "text-answer", "Góp ý khác", &[]),
        ];

        let classification = classify(&elements);
        let entries: Vec<_> = classification
            .text_questions
            .iter()
            .map(|(id, content)| (id.as_str(), content.as_str()))
            .collect();
        assert_eq!(entries, vec![("t1", "Góp ý khác"), ("t2", "Đề xuất")]);
    }

    #[test]
    fn test_empty_elements() {
        let classification = classify(&[]);
        assert_eq!(classification, Classification::default());
    }
}
