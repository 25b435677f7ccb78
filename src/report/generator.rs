//! Markdown and JSON report generation.
//!
//! This module renders survey statistics as the dashboard tables: one
//! table per question group and one listing per text question.

use crate::config::ReportConfig;
use crate::models::{
    ControlType, OptionSet, QuestionStats, ReportMetadata, SurveyReport, TextAnswers,
};
use anyhow::Result;
use indexmap::IndexMap;

/// Rendering options for the Markdown report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Decimal places for percentages.
    pub precision: usize,
    /// Render the free-text answer section.
    pub include_text_answers: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            include_text_answers: true,
        }
    }
}

impl From<&ReportConfig> for ReportOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            precision: config.precision,
            include_text_answers: config.include_text_answers,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SurveyReport, options: &ReportOptions) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# Thống kê khảo sát: {}\n\n",
        report.metadata.title
    ));

    output.push_str(&generate_overview_section(&report.metadata));

    if report.stats.stats.is_empty() {
        output.push_str("*Không có câu hỏi lựa chọn nào để thống kê.*\n\n");
    }
    for (control_type, groups) in &report.stats.stats {
        for (index, (option_set, questions)) in groups.iter().enumerate() {
            output.push_str(&generate_group_section(
                control_type,
                index + 1,
                option_set,
                questions,
                options.precision,
            ));
        }
    }

    if options.include_text_answers {
        output.push_str(&generate_text_answers_section(&report.stats.text_answers));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the general information section.
fn generate_overview_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Thông tin chung\n\n");
    section.push_str("| Cơ sở đào tạo | Số phiếu phát ra | Số phiếu thu vào |\n");
    section.push_str("|:---|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        escape_cell(&metadata.facility_name),
        metadata.total_answers,
        metadata.valid_answers
    ));
    let facility_id = metadata
        .facility_id
        .as_deref()
        .map(|id| format!(" | Mã cơ sở: {}", id))
        .unwrap_or_default();
    section.push_str(&format!(
        "*Mã khảo sát: {}{} | Ngày lập: {}*\n\n",
        metadata.survey_id,
        facility_id,
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    section
}

/// Heading of a question group table.
fn group_heading(control_type: &ControlType, index: usize, option_set: &OptionSet) -> String {
    format!(
        "Bảng thống kê nhóm câu hỏi {} {} ({})",
        control_type.title(),
        index,
        option_set
    )
}

fn has_satisfaction_columns(control_type: &ControlType, option_set: &OptionSet) -> bool {
    *control_type == ControlType::SingleChoice && option_set.is_satisfaction_scale()
}

/// Generate the table of one question group.
fn generate_group_section(
    control_type: &ControlType,
    index: usize,
    option_set: &OptionSet,
    questions: &[QuestionStats],
    precision: usize,
) -> String {
    let mut section = String::new();
    let satisfaction = has_satisfaction_columns(control_type, option_set);

    section.push_str(&format!(
        "## {}\n\n",
        group_heading(control_type, index, option_set)
    ));

    let mut columns = vec!["TT".to_string(), "Câu hỏi".to_string()];
    for label in option_set.labels() {
        columns.push(format!("{} (Số lượng)", label));
        columns.push(format!("{} (%)", label));
    }
    if satisfaction {
        columns.extend(
            [
                "Số phiếu KHL",
                "Không hài lòng (%) (Tổng)",
                "Số phiếu HL",
                "Hài lòng (%) (Tổng)",
            ]
            .map(String::from),
        );
    }

    let alignments: Vec<&str> = columns
        .iter()
        .enumerate()
        .map(|(i, _)| if i == 1 { ":---" } else { ":---:" })
        .collect();

    section.push_str(&table_row(columns.iter().map(|c| escape_cell(c))));
    section.push_str(&table_row(alignments.into_iter().map(String::from)));

    for (number, stats) in questions.iter().enumerate() {
        let mut row = vec![(number + 1).to_string(), escape_cell(&stats.question)];
        for label in option_set.labels() {
            let count = stats.option_counts.get(label).copied().unwrap_or(0);
            let percent = stats.percentages.get(label).copied().unwrap_or(0.0);
            row.push(count.to_string());
            row.push(format_percent(percent, precision));
        }
        if satisfaction {
            match stats.satisfaction_stats {
                Some(rollup) => row.extend([
                    rollup.dissatisfied.count.to_string(),
                    format_percent(rollup.dissatisfied.percent, precision),
                    rollup.satisfied.count.to_string(),
                    format_percent(rollup.satisfied.percent, precision),
                ]),
                None => row.extend(std::iter::repeat(String::new()).take(4)),
            }
        }
        section.push_str(&table_row(row.into_iter()));
    }
    section.push('\n');

    section
}

/// Generate the free-text answer section.
fn generate_text_answers_section(text_answers: &IndexMap<String, TextAnswers>) -> String {
    if text_answers.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Câu trả lời tự luận\n\n");
    for collected in text_answers.values() {
        section.push_str(&format!(
            "**Câu hỏi: {}**\n\n",
            collected.question.replace('\n', " ")
        ));
        section.push_str("| STT | Câu trả lời |\n");
        section.push_str("|:---:|:---|\n");
        for (number, answer) in collected.answers.iter().enumerate() {
            section.push_str(&format!("| {} | {} |\n", number + 1, escape_cell(answer)));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Báo cáo được tạo bởi SurveyStat*\n".to_string()
}

fn table_row(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();
    format!("| {} |\n", cells.join(" | "))
}

/// Format a percentage with `precision` decimals and a `%` suffix.
pub fn format_percent(value: f64, precision: usize) -> String {
    format!("{:.*}%", precision, value)
}

/// Escape text for use inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SurveyReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
