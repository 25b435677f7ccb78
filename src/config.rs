//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.surveystat.toml` files.

use crate::source::file::UNKNOWN_FACILITY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".surveystat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "survey_report.md".to_string()
}

/// Survey data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Root directory of the survey file store.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Facility name shown when a survey has none.
    #[serde(default = "default_unknown_facility")]
    pub unknown_facility: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            unknown_facility: default_unknown_facility(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_unknown_facility() -> String {
    UNKNOWN_FACILITY.to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for percentages.
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Include the free-text answer section.
    #[serde(default = "default_true")]
    pub include_text_answers: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            include_text_answers: true,
        }
    }
}

fn default_precision() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref data_dir) = args.data_dir {
            self.source.data_dir = data_dir.display().to_string();
        }
        if let Some(precision) = args.precision {
            self.report.precision = precision;
        }

        // Flags always override
        if args.no_text_answers {
            self.report.include_text_answers = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "survey_report.md");
        assert_eq!(config.source.data_dir, "data");
        assert_eq!(config.source.unknown_facility, "Không xác định");
        assert_eq!(config.report.precision, 2);
        assert!(config.report.include_text_answers);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "bao_cao.md"
verbose = true

[source]
data_dir = "/srv/surveys"

[report]
precision = 1
include_text_answers = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "bao_cao.md");
        assert!(config.general.verbose);
        assert_eq!(config.source.data_dir, "/srv/surveys");
        assert_eq!(config.source.unknown_facility, "Không xác định");
        assert_eq!(config.report.precision, 1);
        assert!(!config.report.include_text_answers);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.report.precision, 2);
    }

    #[test]
    fn test_merge_with_args_only_overrides_explicit_values() {
        let mut config = Config::default();
        config.report.precision = 1;

        let args = crate::cli::Args {
            survey: Some("s1".to_string()),
            data_dir: Some(PathBuf::from("/tmp/surveys")),
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            precision: None,
            no_text_answers: true,
            list: false,
            init_config: false,
        };
        config.merge_with_args(&args);

        assert_eq!(config.source.data_dir, "/tmp/surveys");
        assert_eq!(config.general.output, "survey_report.md");
        assert_eq!(config.report.precision, 1);
        assert!(!config.report.include_text_answers);
    }

    #[test]
    fn test_config_verbosity_sets_log_level() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let mut args = crate::cli::Args {
            survey: Some("s1".to_string()),
            data_dir: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            precision: None,
            no_text_answers: false,
            list: false,
            init_config: false,
        };
        config.merge_with_args(&args);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
        assert_eq!(
            args.log_level(Config::default().general.verbose),
            tracing::Level::INFO
        );

        args.quiet = true;
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::ERROR);
    }
}
