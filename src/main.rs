//! SurveyStat - survey response statistics
//!
//! A CLI tool that aggregates survey answer records into per-question
//! frequency and percentage tables, grouped by question type and option
//! set, and renders them as Markdown or JSON reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing data directory, unreadable files, bad config)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::SurveyReport;
use report::ReportOptions;
use source::{FileSource, SurveySource};
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("SurveyStat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(&args, &config) {
        error!("Survey report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .surveystat.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the data directory, output and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report written to stdout stays clean.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the list or report workflow.
fn run(args: &Args, config: &Config) -> Result<()> {
    let source = FileSource::new(&config.source.data_dir)
        .with_unknown_facility(config.source.unknown_facility.clone());
    info!("Data directory: {}", source.data_dir().display());

    if args.list {
        return handle_list(&source);
    }

    generate_report(args, config, &source)
}

/// Handle --list: print the available surveys.
fn handle_list(source: &FileSource) -> Result<()> {
    let surveys = source.list_surveys()?;

    if surveys.is_empty() {
        println!("No surveys found in {}", source.data_dir().display());
        return Ok(());
    }

    println!("📋 {} surveys:\n", surveys.len());
    for survey in &surveys {
        println!(
            "   {}  {}",
            survey.id,
            survey.title.as_deref().unwrap_or("(untitled)")
        );
    }

    Ok(())
}

/// Aggregate one survey and write its report.
fn generate_report(args: &Args, config: &Config, source: &FileSource) -> Result<()> {
    let survey_id = args.survey_id();

    let (details, stats) = analysis::process_survey(survey_id, source)
        .with_context(|| format!("Failed to process survey {}", survey_id))?;

    let report = SurveyReport::new(&details, stats);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, &ReportOptions::from(&config.report))
        }
    };

    let destination = Path::new(&config.general.output);
    if destination == Path::new("-") {
        std::io::stdout()
            .write_all(output.as_bytes())
            .context("Failed to write report to stdout")?;
        return Ok(());
    }

    std::fs::write(destination, &output)
        .with_context(|| format!("Failed to write report to {}", destination.display()))?;

    // Print summary
    println!("\n📊 Survey Summary: {}", report.metadata.title);
    println!("   Facility: {}", report.metadata.facility_name);
    println!(
        "   Sheets issued: {} | collected: {}",
        report.metadata.total_answers, report.metadata.valid_answers
    );
    println!(
        "   Question groups: {} | choice questions: {} | text questions answered: {}",
        report.stats.group_count(),
        report.stats.question_count(),
        report.stats.text_answers.len()
    );
    println!(
        "\n✅ Report saved to: {}",
        destination.display()
    );

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems are reported on stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(config) => Ok(config.unwrap_or_default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
