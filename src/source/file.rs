//! File-backed survey source.
//!
//! Each survey lives in its own directory under the data root:
//!
//! ```text
//! <data_dir>/<survey_id>/survey.json
//! <data_dir>/<survey_id>/answers.json
//! ```
//!
//! `survey.json` accepts both snake_case keys and the upper-case column
//! names of a database export. `answers.json` is an array of rows, each an
//! answer object, a string holding an encoded answer object, or `null`.

use super::{SourceError, SurveySource, SurveySummary};
use crate::models::{AnswerRecord, Element, RawResponse, SurveyDetails};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SURVEY_FILE: &str = "survey.json";
const ANSWERS_FILE: &str = "answers.json";

/// Default facility label when a survey has none.
pub const UNKNOWN_FACILITY: &str = "Không xác định";

/// Survey source reading JSON exports from a directory tree.
#[derive(Debug, Clone)]
pub struct FileSource {
    data_dir: PathBuf,
    unknown_facility: String,
}

/// Contents of `survey.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SurveyFile {
    #[serde(alias = "ID", deserialize_with = "string_like")]
    id: Option<String>,
    #[serde(alias = "TITLE")]
    title: Option<String>,
    #[serde(alias = "CO_SO_DAO_TAO_ID", deserialize_with = "string_like")]
    facility_id: Option<String>,
    #[serde(alias = "MA_DON_VI")]
    facility_name: Option<String>,
    #[serde(alias = "ELEMENTS")]
    elements: Value,
}

/// Decoded `answers.json`.
#[derive(Debug, Default)]
struct AnswerSheet {
    /// Number of rows.
    total: u64,
    /// Rows whose answers are not null.
    valid: u64,
    /// Decoded, non-empty answer records.
    records: Vec<AnswerRecord>,
}

fn string_like<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl FileSource {
    /// Create a source rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            unknown_facility: UNKNOWN_FACILITY.to_string(),
        }
    }

    /// Override the facility label used when a survey has none.
    pub fn with_unknown_facility(mut self, label: impl Into<String>) -> Self {
        self.unknown_facility = label.into();
        self
    }

    /// Returns the data root.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn ensure_data_dir(&self) -> Result<(), SourceError> {
        if self.data_dir.is_dir() {
            Ok(())
        } else {
            Err(SourceError::DataDir(self.data_dir.clone()))
        }
    }

    /// Directory of a survey, or `None` if the id cannot name one.
    fn survey_dir(&self, survey_id: &str) -> Option<PathBuf> {
        let valid = !survey_id.is_empty()
            && survey_id != "."
            && survey_id != ".."
            && !survey_id.contains(['/', '\\']);

        valid.then(|| self.data_dir.join(survey_id))
    }

    fn read_survey_file(&self, path: &Path) -> Result<SurveyFile, SourceError> {
        let content = read_file(path)?;
        serde_json::from_str(&content).map_err(|source| SourceError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_answer_sheet(&self, survey_dir: &Path) -> Result<AnswerSheet, SourceError> {
        let path = survey_dir.join(ANSWERS_FILE);
        if !path.exists() {
            debug!("No answers file at {}", path.display());
            return Ok(AnswerSheet::default());
        }

        let content = read_file(&path)?;
        let rows: Vec<Value> = serde_json::from_str(&content).map_err(|source| {
            SourceError::Parse {
                path: path.clone(),
                source,
            }
        })?;

        let mut sheet = AnswerSheet {
            total: rows.len() as u64,
            ..Default::default()
        };

        for (index, row) in rows.into_iter().enumerate() {
            let answers = unwrap_answers_column(row);
            if answers.is_null() {
                continue;
            }
            sheet.valid += 1;

            match decode_answer_row(answers) {
                Ok(record) if !record.is_empty() => sheet.records.push(record),
                Ok(_) => debug!("Skipping empty answer row {} in {}", index, path.display()),
                Err(reason) => warn!(
                    "Skipping answer row {} in {}: {}",
                    index,
                    path.display(),
                    reason
                ),
            }
        }

        debug!(
            "Loaded {} answer records ({} rows, {} with answers) from {}",
            sheet.records.len(),
            sheet.total,
            sheet.valid,
            path.display()
        );

        Ok(sheet)
    }
}

impl SurveySource for FileSource {
    fn unknown_facility(&self) -> &str {
        &self.unknown_facility
    }

    fn list_surveys(&self) -> Result<Vec<SurveySummary>, SourceError> {
        self.ensure_data_dir()?;

        let entries = fs::read_dir(&self.data_dir).map_err(|source| SourceError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let mut surveys = Vec::new();
        for entry in entries.flatten() {
            let survey_path = entry.path().join(SURVEY_FILE);
            if !survey_path.is_file() {
                continue;
            }

            let id = entry.file_name().to_string_lossy().to_string();
            match self.read_survey_file(&survey_path) {
                Ok(survey) => surveys.push(SurveySummary {
                    id,
                    title: survey.title,
                }),
                Err(e) => warn!("Skipping survey {}: {}", id, e),
            }
        }

        surveys.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(surveys)
    }

    fn survey_details(&self, survey_id: &str) -> Result<Option<SurveyDetails>, SourceError> {
        self.ensure_data_dir()?;

        let Some(survey_dir) = self.survey_dir(survey_id) else {
            return Ok(None);
        };
        let survey_path = survey_dir.join(SURVEY_FILE);
        if !survey_path.is_file() {
            return Ok(None);
        }

        let survey = self.read_survey_file(&survey_path)?;
        if let Some(ref recorded_id) = survey.id {
            if recorded_id != survey_id {
                debug!(
                    "Survey directory {} records id {}",
                    survey_id, recorded_id
                );
            }
        }

        let elements = decode_elements(survey.elements, &survey_path);
        let sheet = self.load_answer_sheet(&survey_dir)?;

        let facility_name = survey
            .facility_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.unknown_facility.clone());

        Ok(Some(SurveyDetails {
            id: survey_id.to_string(),
            title: survey.title,
            facility_id: survey.facility_id,
            facility_name,
            elements,
            total_answers: sheet.total,
            valid_answers: sheet.valid,
        }))
    }

    fn survey_answers(&self, survey_id: &str) -> Result<Vec<AnswerRecord>, SourceError> {
        self.ensure_data_dir()?;

        match self.survey_dir(survey_id) {
            Some(survey_dir) => Ok(self.load_answer_sheet(&survey_dir)?.records),
            None => Ok(Vec::new()),
        }
    }
}

fn read_file(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode the element list, which may be an array or a JSON-encoded string.
///
/// Undecodable input yields an empty list; undecodable elements are skipped.
fn decode_elements(raw: Value, path: &Path) -> Vec<Element> {
    let items = match raw {
        Value::Array(items) => items,
        Value::String(encoded) => match serde_json::from_str::<Vec<Value>>(&encoded) {
            Ok(items) => items,
            Err(e) => {
                warn!("Error decoding elements in {}: {}", path.display(), e);
                return Vec::new();
            }
        },
        Value::Null => return Vec::new(),
        other => {
            warn!(
                "Elements in {} are neither a list nor a string: {}",
                path.display(),
                other
            );
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Element>(item) {
            Ok(element) => Some(element),
            Err(e) => {
                warn!("Skipping element {} in {}: {}", index, path.display(), e);
                None
            }
        })
        .collect()
}

/// Unwrap rows exported as `{"ANSWERS": ...}`.
fn unwrap_answers_column(row: Value) -> Value {
    match row {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("ANSWERS") => {
            map.remove("ANSWERS").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode_answer_row(answers: Value) -> Result<AnswerRecord, String> {
    match answers {
        Value::Object(map) => Ok(into_record(map)),
        Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Object(map)) => Ok(into_record(map)),
            Ok(_) => Err("encoded answers are not an object".to_string()),
            Err(e) => Err(format!("error decoding answers: {}", e)),
        },
        _ => Err("answers are not an object".to_string()),
    }
}

fn into_record(map: Map<String, Value>) -> AnswerRecord {
    map.into_iter()
        .map(|(question_id, value)| (question_id, RawResponse::from(value)))
        .collect()
}
