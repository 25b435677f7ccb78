//! Answer tallying and percentage derivation.
//!
//! Malformed answer values are skipped one by one; they never abort the
//! tally of a question or of a record.

use super::classifier::ChoiceQuestion;
use crate::models::{
    AnswerRecord, ControlType, OptionSet, QuestionStats, SatisfactionBucket, SatisfactionStats,
    SATISFACTION_SCALE,
};
use indexmap::IndexMap;

/// Raw selection counts for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Selections per option label, zero-filled.
    pub option_counts: IndexMap<String, u64>,
    /// Single-choice: records with a valid selection.
    /// Multiple-choice: records answering with a sequence.
    pub total_responses: u64,
}

impl Tally {
    fn empty(options: &OptionSet) -> Self {
        Self {
            option_counts: options.labels().iter().map(|label| (label.clone(), 0)).collect(),
            total_responses: 0,
        }
    }

    fn select(&mut self, options: &OptionSet, index: usize) {
        if let Some(count) = options
            .label(index)
            .and_then(|label| self.option_counts.get_mut(label))
        {
            *count += 1;
        }
    }

    /// Sum of all option counts.
    pub fn total_selections(&self) -> u64 {
        self.option_counts.values().sum()
    }
}

/// Count the selections for `question_id` across all records.
pub fn tally_question(
    control_type: &ControlType,
    question_id: &str,
    options: &OptionSet,
    answers: &[AnswerRecord],
) -> Tally {
    let mut tally = Tally::empty(options);

    for response in answers.iter().filter_map(|record| record.get(question_id)) {
        match control_type {
            ControlType::SingleChoice => {
                if let Some(index) = response.as_index(options.len()) {
                    tally.select(options, index);
                    tally.total_responses += 1;
                }
            }
            ControlType::MultipleChoice => {
                if let Some(entries) = response.as_list() {
                    tally.total_responses += 1;
                    for index in entries.iter().filter_map(|entry| entry.as_index(options.len())) {
                        tally.select(options, index);
                    }
                }
            }
            ControlType::TextAnswer | ControlType::Other(_) => {}
        }
    }

    tally
}

/// Percentage of each option.
///
/// Single-choice divides by responding records, multiple-choice by total
/// selections. A zero denominator yields zero for every option.
pub fn percentages(control_type: &ControlType, tally: &Tally) -> IndexMap<String, f64> {
    let denominator = match control_type {
        ControlType::MultipleChoice => tally.total_selections(),
        _ => tally.total_responses,
    };

    tally
        .option_counts
        .iter()
        .map(|(label, &count)| (label.clone(), percent(count, denominator)))
        .collect()
}

fn percent(count: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        count as f64 / denominator as f64 * 100.0
    }
}

/// Roll the five-point scale up into dissatisfied and satisfied buckets.
///
/// Returns `None` unless the option set is the satisfaction scale.
pub fn satisfaction_stats(
    options: &OptionSet,
    option_counts: &IndexMap<String, u64>,
    percentages: &IndexMap<String, f64>,
) -> Option<SatisfactionStats> {
    if !options.is_satisfaction_scale() {
        return None;
    }

    let bucket = |labels: &[&str]| SatisfactionBucket {
        count: labels
            .iter()
            .filter_map(|label| option_counts.get(*label))
            .sum(),
        percent: labels
            .iter()
            .filter_map(|label| percentages.get(*label))
            .sum(),
    };

    Some(SatisfactionStats {
        dissatisfied: bucket(&SATISFACTION_SCALE[..2]),
        satisfied: bucket(&SATISFACTION_SCALE[2..]),
    })
}

/// Build the full statistics of one choice question.
pub fn question_stats(
    control_type: &ControlType,
    question: &ChoiceQuestion,
    options: &OptionSet,
    answers: &[AnswerRecord],
) -> QuestionStats {
    let tally = tally_question(control_type, &question.id, options, answers);
    let percentages = percentages(control_type, &tally);

    let satisfaction_stats = match control_type {
        ControlType::SingleChoice => satisfaction_stats(options, &tally.option_counts, &percentages),
        _ => None,
    };

    QuestionStats {
        question: question.content.clone(),
        option_counts: tally.option_counts,
        percentages,
        total_responses: tally.total_responses,
        satisfaction_stats,
    }
}
