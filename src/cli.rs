//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Highest supported number of decimal places for percentages.
pub const MAX_PRECISION: usize = 6;

/// SurveyStat - survey response statistics
///
/// Aggregate survey answers into per-question frequency and percentage
/// tables, grouped by question type and option set, plus free-text
/// answer listings. Markdown/JSON reports.
///
/// Examples:
///   surveystat --list --data-dir ./data
///   surveystat --survey 1024 --data-dir ./data
///   surveystat --survey 1024 --format json --output -
///   surveystat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Survey identifier to report on
    #[arg(
        short,
        long,
        value_name = "ID",
        required_unless_present_any = ["list", "init_config"]
    )]
    pub survey: Option<String>,

    /// Root directory of the survey file store
    ///
    /// Each survey lives in <DIR>/<ID>/survey.json and <DIR>/<ID>/answers.json.
    /// Defaults to the config file setting, then ./data.
    #[arg(short, long, value_name = "DIR", env = "SURVEYSTAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output file path for the report ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .surveystat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Decimal places for percentages (0 - 6)
    #[arg(long, value_name = "N")]
    pub precision: Option<usize>,

    /// Leave free-text answers out of the report
    #[arg(long)]
    pub no_text_answers: bool,

    /// List the surveys in the data directory and exit
    #[arg(long)]
    pub list: bool,

    /// Generate a default .surveystat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if !self.list {
            match self.survey.as_deref() {
                None => return Err("A survey id is required (--survey)".to_string()),
                Some(id) if id.trim().is_empty() => {
                    return Err("Survey id must not be empty".to_string())
                }
                Some(_) => {}
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(precision) = self.precision {
            if precision > MAX_PRECISION {
                return Err(format!(
                    "Precision must be between 0 and {}",
                    MAX_PRECISION
                ));
            }
        }

        // Validate data directory if provided
        if let Some(ref data_dir) = self.data_dir {
            if !data_dir.exists() {
                return Err(format!(
                    "Data directory does not exist: {}",
                    data_dir.display()
                ));
            }
            if !data_dir.is_dir() {
                return Err(format!(
                    "Data path is not a directory: {}",
                    data_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Returns the survey id, empty if not set (should be validated first).
    pub fn survey_id(&self) -> &str {
        self.survey.as_deref().unwrap_or("")
    }
}
