//! # Merge Module
//!
//! Turns a dataset and a template into a zip archive of documents, one per row,
//! with every `{{column}}` token replaced by that row's value.
pub(crate) mod archive;
pub mod generator;
pub mod substitute;

use crate::dataset::Dataset;
use crate::document::Template;
use crate::error::RustyMergeError;
use chrono::NaiveDateTime;
use std::fmt;
use thiserror::Error;

/// Rows above which a dataset is reported as large
pub const DEFAULT_ROW_ADVISORY_THRESHOLD: usize = 500;

/// Errors raised by the merge itself.
#[derive(Error, Debug, PartialEq)]
pub enum MergeError {
    #[error("The dataset has no rows; check that the sheet has data below its header row")]
    EmptyDatasetError,

    #[error("Writing the archive failed: {0}")]
    ArchiveError(String),
}

/// Output settings of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateOptions {
    /// Extension of each generated document, without the dot
    pub extension: String,
    /// Row count above which validation reports [`Advisory::LargeDataset`]
    pub row_advisory_threshold: usize,
    /// Entry name prefix; entries are named `<prefix>_<row>.<extension>`
    pub entry_prefix: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            extension: "docx".to_owned(),
            row_advisory_threshold: DEFAULT_ROW_ADVISORY_THRESHOLD,
            entry_prefix: "Document".to_owned(),
        }
    }
}

impl GenerateOptions {
    /// Archive entry name of a row (1-based)
    pub fn entry_name(&self, row: usize) -> String {
        format!("{}_{}.{}", self.entry_prefix, row, self.extension)
    }
}

/// Non-blocking findings of the pre-flight check.
#[derive(Clone, Debug, PartialEq)]
pub enum Advisory {
    /// The batch is bigger than the configured threshold
    LargeDataset { rows: usize, threshold: usize },
    /// The template uses a token that no column fills
    UnmatchedPlaceholder(String),
    /// A token is spread over differently formatted runs and will not be replaced
    SplitPlaceholder(String),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::LargeDataset { rows, threshold } => {
                write!(f, "{rows} rows exceed the advised maximum of {threshold}; generation may take a while")
            }
            Advisory::UnmatchedPlaceholder(key) => {
                write!(f, "No column named '{key}'; {{{{{key}}}}} stays as is in every document")
            }
            Advisory::SplitPlaceholder(key) => write!(
                f,
                "{{{{{key}}}}} mixes formatting inside the token and will not be replaced; retype it with one format"
            ),
        }
    }
}

/// Checks a dataset and template before generation.
///
/// An empty dataset is an error; everything else is reported as advisories and
/// does not prevent generation.
pub fn validate(
    dataset: &Dataset,
    template: &Template,
    options: &GenerateOptions,
) -> Result<Vec<Advisory>, RustyMergeError> {
    if dataset.is_empty() {
        Err(MergeError::EmptyDatasetError)?
    }

    let mut advisories = Vec::new();
    if dataset.len() > options.row_advisory_threshold {
        advisories.push(Advisory::LargeDataset {
            rows: dataset.len(),
            threshold: options.row_advisory_threshold,
        });
    }
    let columns = dataset.columns();
    advisories.extend(
        template
            .placeholders()
            .iter()
            .filter(|key| !columns.contains(*key))
            .map(|key| Advisory::UnmatchedPlaceholder(key.to_owned())),
    );
    advisories.extend(
        template
            .split_placeholders()
            .iter()
            .map(|key| Advisory::SplitPlaceholder(key.to_owned())),
    );
    Ok(advisories)
}

/// Timestamped archive name, `Documents_YYYYmmdd_HHMMSS.zip`
pub fn suggested_archive_name(timestamp: NaiveDateTime) -> String {
    format!("Documents_{}.zip", timestamp.format("%Y%m%d_%H%M%S"))
}
