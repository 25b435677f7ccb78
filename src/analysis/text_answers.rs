//! Free-text answer collection.

use crate::models::{AnswerRecord, TextAnswers};
use indexmap::IndexMap;

/// Collect the non-empty answers of each text question in record order.
///
/// Questions nobody answered are left out of the result.
pub fn collect_text_answers(
    text_questions: &IndexMap<String, String>,
    answers: &[AnswerRecord],
) -> IndexMap<String, TextAnswers> {
    text_questions
        .iter()
        .filter_map(|(question_id, content)| {
            let collected: Vec<String> = answers
                .iter()
                .filter_map(|record| record.get(question_id))
                .filter(|response| response.is_truthy())
                .map(|response| response.to_display_string())
                .collect();

            if collected.is_empty() {
                return None;
            }

            Some((
                question_id.clone(),
                TextAnswers {
                    question: content.clone(),
                    answers: collected,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> Vec<AnswerRecord> {
        values
            .into_iter()
            .map(|value| serde_json::from_value(value).unwrap())
            .collect()
    }

    fn questions(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(id, content)| (id.to_string(), content.to_string()))
            .collect()
    }

    #[test]
    fn test_preserves_record_order_and_skips_empty() {
        let text_questions = questions(&[("t1", "Góp ý")]);
        let answers = records(vec![
            json!({"t1": "Thứ nhất"}),
            json!({"t1": ""}),
            json!({"t1": null}),
            json!({"x": "khác"}),
            json!({"t1": "Thứ hai"}),
        ]);

        let collected = collect_text_answers(&text_questions, &answers);

        assert_eq!(collected["t1"].question, "Góp ý");
        assert_eq!(collected["t1"].answers, vec!["Thứ nhất", "Thứ hai"]);
    }

    #[test]
    fn test_omits_questions_without_answers() {
        let text_questions = questions(&[("t1", "Góp ý"), ("t2", "Đề xuất")]);
        let answers = records(vec![json!({"t1": "", "t2": "Có"}), json!({"t1": null})]);

        let collected = collect_text_answers(&text_questions, &answers);

        assert!(!collected.contains_key("t1"));
        assert_eq!(collected.len(), 1);
        assert_eq!(collected["t2"].answers, vec!["Có"]);
    }

    #[test]
    fn test_non_string_values_are_rendered() {
        let text_questions = questions(&[("t1", "Số năm")]);
        let answers = records(vec![json!({"t1": 3}), json!({"t1": 0}), json!({"t1": false})]);

        let collected = collect_text_answers(&text_questions, &answers);
        assert_eq!(collected["t1"].answers, vec!["3"]);
    }

    #[test]
    fn test_keeps_question_order() {
        let text_questions = questions(&[("b", "B"), ("a", "A")]);
        let answers = records(vec![json!({"a": "x", "b": "y"})]);

        let collected = collect_text_answers(&text_questions, &answers);
        let ids: Vec<_> = collected.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
