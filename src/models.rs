//! Data models for survey aggregation.
//!
//! This module contains the survey definition and raw answer shapes
//! delivered by a data source, and the statistics structures produced
//! by the aggregation engine.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// The five-point satisfaction scale, from most to least dissatisfied.
pub const SATISFACTION_SCALE: [&str; 5] = [
    "Rất không hài lòng",
    "Không hài lòng",
    "Bình thường",
    "Hài lòng",
    "Rất hài lòng",
];

/// Control type of a survey element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ControlType {
    /// One option selected by index.
    SingleChoice,
    /// Zero or more options selected by index.
    MultipleChoice,
    /// Free-form text.
    TextAnswer,
    /// Any other element (headings, images, ...). Ignored by statistics.
    Other(String),
}

impl ControlType {
    /// Returns the wire name of the control type.
    pub fn as_str(&self) -> &str {
        match self {
            ControlType::SingleChoice => "single-choice",
            ControlType::MultipleChoice => "multiple-choice",
            ControlType::TextAnswer => "text-answer",
            ControlType::Other(s) => s,
        }
    }

    /// Returns the display title, e.g. `Single Choice`.
    pub fn title(&self) -> String {
        self.as_str()
            .replace('-', " ")
            .split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

impl Default for ControlType {
    fn default() -> Self {
        ControlType::Other(String::new())
    }
}

impl From<&str> for ControlType {
    fn from(s: &str) -> Self {
        match s {
            "single-choice" => ControlType::SingleChoice,
            "multiple-choice" => ControlType::MultipleChoice,
            "text-answer" => ControlType::TextAnswer,
            other => ControlType::Other(other.to_string()),
        }
    }
}

impl From<String> for ControlType {
    fn from(s: String) -> Self {
        ControlType::from(s.as_str())
    }
}

impl From<ControlType> for String {
    fn from(control_type: ControlType) -> Self {
        control_type.as_str().to_string()
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Question payload attached to an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionData {
    /// Display text of the question.
    #[serde(rename = "CONTENT", alias = "content", default)]
    pub content: String,
    /// Option labels in declared order. Empty for text questions.
    #[serde(
        rename = "OPTIONS",
        alias = "options",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub options: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single element of a survey form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Identifier, unique within a survey. Answer records are keyed by it.
    #[serde(default)]
    pub id: String,
    /// Control type.
    #[serde(rename = "controlType", default)]
    pub control_type: ControlType,
    /// Question payload, absent for decorative elements.
    ///
    /// A missing, null or `{}` payload is absent. Any other object is kept,
    /// even when its content is blank.
    #[serde(
        rename = "questionData",
        default,
        deserialize_with = "non_empty_payload",
        skip_serializing_if = "Option::is_none"
    )]
    pub question_data: Option<QuestionData>,
}

impl Element {
    /// Returns the question payload if present.
    pub fn question(&self) -> Option<&QuestionData> {
        self.question_data.as_ref()
    }
}

fn non_empty_payload<'de, D>(deserializer: D) -> Result<Option<QuestionData>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Map<String, Value>>::deserialize(deserializer)? {
        Some(payload) if !payload.is_empty() => QuestionData::deserialize(Value::Object(payload))
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Survey definition as delivered by a data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyDetails {
    /// Survey identifier.
    pub id: String,
    /// Dedicated survey title.
    pub title: Option<String>,
    /// Identifier of the training facility running the survey.
    pub facility_id: Option<String>,
    /// Display name of the facility.
    pub facility_name: String,
    /// Form elements in display order.
    pub elements: Vec<Element>,
    /// Number of response sheets issued.
    pub total_answers: u64,
    /// Number of response sheets collected with answers.
    pub valid_answers: u64,
}

impl SurveyDetails {
    /// Returns the title to display, falling back to the survey id.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.id,
        }
    }
}

/// A raw response value as stored in an answer record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum RawResponse {
    /// A string: an option index or free text.
    Text(String),
    /// A sequence of values, normally option index strings.
    List(Vec<RawResponse>),
    /// Anything else (numbers, booleans, objects, null).
    Other(Value),
}

impl RawResponse {
    /// Interprets the response as an index into `option_count` options.
    ///
    /// Only a non-empty string of ASCII digits whose value is below
    /// `option_count` is an index.
    pub fn as_index(&self, option_count: usize) -> Option<usize> {
        match self {
            RawResponse::Text(s) => parse_index(s).filter(|&index| index < option_count),
            RawResponse::List(_) | RawResponse::Other(_) => None,
        }
    }

    /// Returns the entries of a sequence response.
    pub fn as_list(&self) -> Option<&[RawResponse]> {
        match self {
            RawResponse::List(items) => Some(items),
            RawResponse::Text(_) | RawResponse::Other(_) => None,
        }
    }

    /// Returns false for empty strings, empty sequences, null, false, zero
    /// and empty objects.
    pub fn is_truthy(&self) -> bool {
        match self {
            RawResponse::Text(s) => !s.is_empty(),
            RawResponse::List(items) => !items.is_empty(),
            RawResponse::Other(value) => match value {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
                Value::String(s) => !s.is_empty(),
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
            },
        }
    }

    /// Renders the response as display text. Strings are returned verbatim,
    /// everything else as compact JSON.
    pub fn to_display_string(&self) -> String {
        match self {
            RawResponse::Text(s) => s.clone(),
            other => Value::from(other).to_string(),
        }
    }
}

fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RawResponse::Text(s),
            Value::Array(items) => RawResponse::List(items.into_iter().map(Self::from).collect()),
            other => RawResponse::Other(other),
        }
    }
}

impl From<&RawResponse> for Value {
    fn from(response: &RawResponse) -> Self {
        match response {
            RawResponse::Text(s) => Value::String(s.clone()),
            RawResponse::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            RawResponse::Other(value) => value.clone(),
        }
    }
}

impl From<&str> for RawResponse {
    fn from(s: &str) -> Self {
        RawResponse::Text(s.to_string())
    }
}

/// One respondent's answers, keyed by question id.
pub type AnswerRecord = IndexMap<String, RawResponse>;

/// Ordered option labels identifying a question group.
///
/// Equality and hashing cover the full sequence, so the same labels in a
/// different order form a different set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OptionSet(Vec<String>);

impl OptionSet {
    /// Creates an option set from labels in declared order.
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    /// Returns the labels in declared order.
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Returns the label at `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the labels are set-equal to [`SATISFACTION_SCALE`].
    pub fn is_satisfaction_scale(&self) -> bool {
        self.0.iter().all(|label| SATISFACTION_SCALE.contains(&label.as_str()))
            && SATISFACTION_SCALE
                .iter()
                .all(|canonical| self.0.iter().any(|label| label == canonical))
    }
}

impl<S: Into<String>> FromIterator<S> for OptionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

/// Combined count and percentage of a satisfaction bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SatisfactionBucket {
    pub count: u64,
    pub percent: f64,
}

/// Two-bucket roll-up of the five-point satisfaction scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SatisfactionStats {
    #[serde(rename = "Không hài lòng")]
    pub dissatisfied: SatisfactionBucket,
    #[serde(rename = "Hài lòng")]
    pub satisfied: SatisfactionBucket,
}

/// Statistics for one choice question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    /// Display text of the question.
    pub question: String,
    /// Selections per option, every declared option present.
    pub option_counts: IndexMap<String, u64>,
    /// Percentage per option, same domain as `option_counts`.
    pub percentages: IndexMap<String, f64>,
    /// Single-choice: records with a valid selection.
    /// Multiple-choice: records answering with a sequence.
    pub total_responses: u64,
    /// Present only for the five-point satisfaction scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction_stats: Option<SatisfactionStats>,
}

/// Collected free-text answers for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAnswers {
    pub question: String,
    pub answers: Vec<String>,
}

/// Choice statistics grouped by control type, then option set.
pub type GroupedStats = IndexMap<ControlType, IndexMap<OptionSet, Vec<QuestionStats>>>;

/// Result of aggregating one survey.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyStats {
    #[serde(serialize_with = "serialize_grouped_stats")]
    pub stats: GroupedStats,
    pub text_answers: IndexMap<String, TextAnswers>,
}

impl SurveyStats {
    /// Looks up the statistics of one question group.
    #[allow(dead_code)] // Lookup for callers holding a known group key
    pub fn group(&self, control_type: &ControlType, options: &OptionSet) -> Option<&[QuestionStats]> {
        self.stats
            .get(control_type)
            .and_then(|groups| groups.get(options))
            .map(Vec::as_slice)
    }

    /// Number of question groups across all control types.
    pub fn group_count(&self) -> usize {
        self.stats.values().map(IndexMap::len).sum()
    }

    /// Number of choice questions across all groups.
    pub fn question_count(&self) -> usize {
        self.stats
            .values()
            .flat_map(IndexMap::values)
            .map(Vec::len)
            .sum()
    }
}

// JSON object keys must be strings, so each control type maps to a list of
// `{options, questions}` groups instead of an option-keyed object.
fn serialize_grouped_stats<S>(stats: &GroupedStats, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    #[derive(Serialize)]
    struct GroupView<'a> {
        options: &'a OptionSet,
        questions: &'a [QuestionStats],
    }

    let mut map = serializer.serialize_map(Some(stats.len()))?;
    for (control_type, groups) in stats {
        let views: Vec<GroupView<'_>> = groups
            .iter()
            .map(|(options, questions)| GroupView { options, questions })
            .collect();
        map.serialize_entry(control_type.as_str(), &views)?;
    }
    map.end()
}

/// Metadata about a survey report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Survey identifier.
    pub survey_id: String,
    /// Display title of the survey.
    pub title: String,
    /// Identifier of the facility, when the source knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,
    /// Facility running the survey.
    pub facility_name: String,
    /// Number of response sheets issued.
    pub total_answers: u64,
    /// Number of response sheets collected.
    pub valid_answers: u64,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
}

/// The complete survey report.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyReport {
    pub metadata: ReportMetadata,
    #[serde(flatten)]
    pub stats: SurveyStats,
}

impl SurveyReport {
    /// Creates a report for `details` stamped with the current time.
    pub fn new(details: &SurveyDetails, stats: SurveyStats) -> Self {
        Self {
            metadata: ReportMetadata {
                survey_id: details.id.clone(),
                title: details.display_title().to_string(),
                facility_id: details.facility_id.clone(),
                facility_name: details.facility_name.clone(),
                total_answers: details.total_answers,
                valid_answers: details.valid_answers,
                generated_at: Utc::now(),
            },
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_control_type_from_str() {
        assert_eq!(ControlType::from("single-choice"), ControlType::SingleChoice);
        assert_eq!(ControlType::from("multiple-choice"), ControlType::MultipleChoice);
        assert_eq!(ControlType::from("text-answer"), ControlType::TextAnswer);
        assert_eq!(
            ControlType::from("rating"),
            ControlType::Other("rating".to_string())
        );
    }

    #[test]
    fn test_control_type_title() {
        assert_eq!(ControlType::SingleChoice.title(), "Single Choice");
        assert_eq!(ControlType::MultipleChoice.title(), "Multiple Choice");
    }

    #[test]
    fn test_element_deserialize() {
        let element: Element = serde_json::from_value(json!({
            "id": "q1",
            "controlType": "single-choice",
            "questionData": {"CONTENT": "Bạn có hài lòng?", "OPTIONS": ["Có", "Không"]}
        }))
        .unwrap();

        assert_eq!(element.control_type, ControlType::SingleChoice);
        let data = element.question().unwrap();
        assert_eq!(data.content, "Bạn có hài lòng?");
        assert_eq!(data.options, vec!["Có", "Không"]);
    }

    #[test]
    fn test_element_null_options_and_empty_data() {
        let element: Element = serde_json::from_value(json!({
            "id": "q1",
            "controlType": "single-choice",
            "questionData": {"CONTENT": "Câu hỏi", "OPTIONS": null}
        }))
        .unwrap();
        assert!(element.question().unwrap().options.is_empty());

        let empty: Element = serde_json::from_value(json!({
            "id": "h1",
            "controlType": "single-choice",
            "questionData": {}
        }))
        .unwrap();
        assert!(empty.question().is_none());

        let null: Element = serde_json::from_value(json!({
            "id": "h2",
            "controlType": "html",
            "questionData": null
        }))
        .unwrap();
        assert!(null.question().is_none());
    }

    #[test]
    fn test_element_blank_content_keeps_payload() {
        let element: Element = serde_json::from_value(json!({
            "id": "t1",
            "controlType": "text-answer",
            "questionData": {"CONTENT": ""}
        }))
        .unwrap();

        let data = element.question().unwrap();
        assert!(data.content.is_empty());
        assert!(data.options.is_empty());
    }

    #[test]
    fn test_raw_response_as_index() {
        assert_eq!(RawResponse::from("0").as_index(2), Some(0));
        assert_eq!(RawResponse::from("1").as_index(2), Some(1));
        assert_eq!(RawResponse::from("2").as_index(2), None);
        assert_eq!(RawResponse::from("-1").as_index(2), None);
        assert_eq!(RawResponse::from("bad").as_index(2), None);
        assert_eq!(RawResponse::from("").as_index(2), None);
        assert_eq!(RawResponse::from(" 1").as_index(2), None);
        assert_eq!(RawResponse::from("99999999999999999999999").as_index(2), None);
        assert_eq!(RawResponse::from(json!(1)).as_index(2), None);
        assert_eq!(RawResponse::from(json!(["1"])).as_index(2), None);
    }

    #[test]
    fn test_raw_response_from_nested_json() {
        let response = RawResponse::from(json!(["0", 2, null]));
        assert_eq!(
            response,
            RawResponse::List(vec![
                RawResponse::Text("0".to_string()),
                RawResponse::Other(json!(2)),
                RawResponse::Other(Value::Null),
            ])
        );
    }

    #[test]
    fn test_raw_response_truthiness() {
        assert!(RawResponse::from("x").is_truthy());
        assert!(!RawResponse::from("").is_truthy());
        assert!(!RawResponse::from(json!(null)).is_truthy());
        assert!(!RawResponse::from(json!([])).is_truthy());
        assert!(!RawResponse::from(json!(0)).is_truthy());
        assert!(!RawResponse::from(json!(false)).is_truthy());
        assert!(RawResponse::from(json!(3)).is_truthy());
        assert!(RawResponse::from(json!(["a"])).is_truthy());
    }

    #[test]
    fn test_raw_response_display() {
        assert_eq!(RawResponse::from("Tốt").to_display_string(), "Tốt");
        assert_eq!(RawResponse::from(json!(["0", "1"])).to_display_string(), r#"["0","1"]"#);
        assert_eq!(RawResponse::from(json!(5)).to_display_string(), "5");
    }

    #[test]
    fn test_option_set_identity_is_order_sensitive() {
        let yes_no: OptionSet = ["Yes", "No"].into_iter().collect();
        let no_yes: OptionSet = ["No", "Yes"].into_iter().collect();
        assert_ne!(yes_no, no_yes);
        assert_eq!(yes_no, OptionSet::new(vec!["Yes".to_string(), "No".to_string()]));
        assert_eq!(yes_no.to_string(), "Yes, No");
    }

    #[test]
    fn test_option_set_satisfaction_scale() {
        let canonical: OptionSet = SATISFACTION_SCALE.into_iter().collect();
        assert!(canonical.is_satisfaction_scale());

        let shuffled: OptionSet = [
            "Hài lòng",
            "Rất hài lòng",
            "Bình thường",
            "Không hài lòng",
            "Rất không hài lòng",
        ]
        .into_iter()
        .collect();
        assert!(shuffled.is_satisfaction_scale());

        let partial: OptionSet = SATISFACTION_SCALE[..4].iter().copied().collect();
        assert!(!partial.is_satisfaction_scale());

        let extra: OptionSet = SATISFACTION_SCALE
            .iter()
            .copied()
            .chain(["Khác"])
            .collect();
        assert!(!extra.is_satisfaction_scale());
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        let mut details = SurveyDetails {
            id: "s-1".to_string(),
            ..Default::default()
        };
        assert_eq!(details.display_title(), "s-1");

        details.title = Some("Khảo sát 2024".to_string());
        assert_eq!(details.display_title(), "Khảo sát 2024");
    }

    #[test]
    fn test_survey_stats_serializes_groups_as_lists() {
        let mut stats = SurveyStats::default();
        let options: OptionSet = ["A", "B"].into_iter().collect();
        stats
            .stats
            .entry(ControlType::SingleChoice)
            .or_default()
            .insert(
                options,
                vec![QuestionStats {
                    question: "Q".to_string(),
                    option_counts: [("A".to_string(), 1), ("B".to_string(), 0)].into_iter().collect(),
                    percentages: [("A".to_string(), 100.0), ("B".to_string(), 0.0)]
                        .into_iter()
                        .collect(),
                    total_responses: 1,
                    satisfaction_stats: None,
                }],
            );

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["stats"]["single-choice"][0]["options"], json!(["A", "B"]));
        assert_eq!(
            json["stats"]["single-choice"][0]["questions"][0]["option_counts"]["A"],
            json!(1)
        );
        assert!(json["stats"]["single-choice"][0]["questions"][0]
            .get("satisfaction_stats")
            .is_none());
    }
}
