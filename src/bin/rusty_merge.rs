//! Rusty Merge CLI Binary
//!
//! Reads a workbook and a Word template, writes one document per row into a
//! timestamped zip archive and reports rows that could not be rendered.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use rusty_merge::logging::init_logging;
use rusty_merge::logging::LogFormat;
use rusty_merge::logging::LoggingConfig;
use rusty_merge::merge::DEFAULT_ROW_ADVISORY_THRESHOLD;
use rusty_merge::merge::MergeError;
use rusty_merge::{
    generate_with, read_dataset, read_source, suggested_archive_name, validate, Criteria, GenerateOptions,
    RustyMergeError, Template,
};
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rusty-merge", version, about = "Generate one Word document per spreadsheet row")]
struct Cli {
    /// Workbook with the records (.xlsx path or file:// URL)
    #[arg(long, short = 'd')]
    data: String,

    /// Word template with {{Column}} placeholders (.docx path or file:// URL)
    #[arg(long, short = 't')]
    template: String,

    /// Directory the archive is written to
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// Sheet name or glob pattern; defaults to the first sheet
    #[arg(long)]
    sheet: Option<String>,

    /// Data range such as A1:D20; its first row is the header
    #[arg(long)]
    range: Option<String>,

    /// Row count above which a warning is printed
    #[arg(long, default_value_t = DEFAULT_ROW_ADVISORY_THRESHOLD)]
    row_threshold: usize,

    /// Log level or filter directive (overridden by RUSTY_MERGE_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Disable colored log output
    #[arg(long)]
    no_color: bool,
}

/// Step of a run, used to pick the remediation hint of a failure
#[derive(Clone, Copy, Debug)]
enum Stage {
    Data,
    Template,
    Validation,
    Output,
}

impl Stage {
    fn hint(self, error: &anyhow::Error) -> &'static str {
        let empty_dataset = matches!(
            error.downcast_ref::<RustyMergeError>(),
            Some(RustyMergeError::MergeError(MergeError::EmptyDatasetError))
        );
        match self {
            Stage::Validation if empty_dataset => {
                "Verify that the sheet has at least one data row below its header row"
            }
            Stage::Data => "Verify that the file is an .xlsx workbook and that --sheet and --range match its layout",
            Stage::Template => {
                "Verify that the template is a .docx document and that placeholders are written as {{Column}}"
            }
            Stage::Validation => "Verify the data and the template placeholder syntax",
            Stage::Output => "Verify that the output directory is writable and has free space",
        }
    }
}

struct Failure {
    stage: Stage,
    error: anyhow::Error,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, Failure>;
}

impl<T, E: Into<anyhow::Error>> AtStage<T> for Result<T, E> {
    fn at(self, stage: Stage) -> Result<T, Failure> {
        self.map_err(|error| Failure { stage, error: error.into() })
    }
}

fn main() {
    let cli = Cli::parse();

    let logging_config = LoggingConfig {
        level: cli.log_level.clone(),
        format: cli.log_format,
        color: !cli.no_color,
    };
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(failure) = run(&cli) {
        error!(stage = ?failure.stage, "run failed: {:#}", failure.error);
        eprintln!("Error: {:#}", failure.error);
        eprintln!("Hint: {}", failure.stage.hint(&failure.error));
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let criteria = Criteria::new(cli.sheet.as_deref(), cli.range.as_deref()).at(Stage::Data)?;
    let dataset = read_source(&cli.data)
        .and_then(|bytes| read_dataset(bytes, &criteria))
        .with_context(|| format!("Failed to read records from '{}'", cli.data))
        .at(Stage::Data)?;
    info!(rows = dataset.len(), columns = ?dataset.columns(), "dataset loaded");

    let template = read_source(&cli.template)
        .and_then(Template::from_bytes)
        .with_context(|| format!("Failed to read template '{}'", cli.template))
        .at(Stage::Template)?;

    let options = GenerateOptions {
        row_advisory_threshold: cli.row_threshold,
        ..GenerateOptions::default()
    };
    let advisories = validate(&dataset, &template, &options).at(Stage::Validation)?;
    for advisory in &advisories {
        eprintln!("Warning: {advisory}");
    }

    let batch = generate_with(&dataset, &template, &options).at(Stage::Output)?;
    let path = cli.output_dir.join(suggested_archive_name(Local::now().naive_local()));
    std::fs::create_dir_all(&cli.output_dir)
        .and_then(|_| std::fs::write(&path, &batch.archive))
        .with_context(|| format!("Failed to write '{}'", path.display()))
        .at(Stage::Output)?;

    println!("Generated {} document(s) into {}", batch.success_count, path.display());
    for row_error in &batch.errors {
        eprintln!("Skipped {row_error}");
    }
    Ok(())
}
