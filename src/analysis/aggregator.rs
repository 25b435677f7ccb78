//! Survey aggregation.
//!
//! This module ties classification, tallying and text collection together
//! into the statistics of a whole survey.

use super::classifier::classify;
use super::tally::question_stats;
use super::text_answers::collect_text_answers;
use crate::models::{AnswerRecord, Element, GroupedStats, SurveyDetails, SurveyStats};
use crate::source::{SourceError, SurveySource};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Aggregate answer records against a survey's elements.
///
/// Pure function of its inputs. Malformed answers are ignored and never
/// cause an error; empty inputs yield empty statistics.
pub fn aggregate(elements: &[Element], answers: &[AnswerRecord]) -> SurveyStats {
    let classification = classify(elements);

    let mut stats = GroupedStats::new();
    for (control_type, groups) in &classification.choice_groups {
        let type_stats: IndexMap<_, _> = groups
            .iter()
            .map(|(options, questions)| {
                let group_stats = questions
                    .iter()
                    .map(|question| question_stats(control_type, question, options, answers))
                    .collect::<Vec<_>>();
                (options.clone(), group_stats)
            })
            .collect();

        debug!(
            "{}: {} groups, {} questions",
            control_type,
            type_stats.len(),
            type_stats.values().map(Vec::len).sum::<usize>()
        );
        stats.insert(control_type.clone(), type_stats);
    }

    let text_answers = collect_text_answers(&classification.text_questions, answers);
    debug!(
        "{} of {} text questions have answers",
        text_answers.len(),
        classification.text_questions.len()
    );

    SurveyStats {
        stats,
        text_answers,
    }
}

/// Fetch a survey and its answers from `source` and aggregate them.
///
/// An unknown survey is not an error: it yields details carrying only the
/// id and the source's unknown-facility label, with empty statistics.
pub fn process_survey(
    survey_id: &str,
    source: &dyn SurveySource,
) -> Result<(SurveyDetails, SurveyStats), SourceError> {
    let Some(details) = source.survey_details(survey_id)? else {
        warn!("Survey {} not found, reporting empty statistics", survey_id);
        let details = SurveyDetails {
            id: survey_id.to_string(),
            facility_name: source.unknown_facility().to_string(),
            ..Default::default()
        };
        return Ok((details, aggregate(&[], &[])));
    };
    let answers = source.survey_answers(survey_id)?;

    info!(
        "Aggregating {} answer records over {} elements",
        answers.len(),
        details.elements.len()
    );

    let stats = aggregate(&details.elements, &answers);
    Ok((details, stats))
}
