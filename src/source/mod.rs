//! Survey data sources.
//!
//! A data source delivers survey definitions and raw answer records to the
//! aggregation engine. The engine only depends on the [`SurveySource`]
//! trait; [`FileSource`] reads survey exports from a directory tree.

pub mod file;

pub use file::FileSource;

use crate::models::{AnswerRecord, SurveyDetails};
use serde::Serialize;
use std::path::PathBuf;

/// Errors raised while reading survey data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("data directory not found: {}", .0.display())]
    DataDir(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Entry of a survey listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveySummary {
    pub id: String,
    pub title: Option<String>,
}

/// Provider of survey definitions and answer records.
pub trait SurveySource {
    /// Facility label for surveys without a facility name.
    fn unknown_facility(&self) -> &str {
        file::UNKNOWN_FACILITY
    }

    /// List the available surveys, ordered by id.
    fn list_surveys(&self) -> Result<Vec<SurveySummary>, SourceError>;

    /// Fetch a survey definition. Returns `Ok(None)` for an unknown survey.
    fn survey_details(&self, survey_id: &str) -> Result<Option<SurveyDetails>, SourceError>;

    /// Fetch the non-empty answer records of a survey.
    fn survey_answers(&self, survey_id: &str) -> Result<Vec<AnswerRecord>, SourceError>;
}
