//! # Rusty Merge
//!
//! Batch mail merge for Word documents. Every row of a spreadsheet becomes one
//! copy of a `.docx` template in which each `{{Column}}` token is replaced by
//! the row's value; the copies are bundled into a single zip archive.
//!
//! ## Features
//!
//! - **Excel input**: `.xlsx`/`.xlsm` workbooks, with sheet selection by name
//!   pattern and A1-style data ranges; dates and times are recognized from cell formats
//! - **Formatting preserved**: replacement happens inside a run, so bold,
//!   italics and styles around a token survive
//! - **Tables**: tokens in top-level table cells are replaced too
//! - **Row isolation**: a row that cannot be rendered is reported and skipped,
//!   the remaining documents are still produced
//! - **Pre-flight checks**: empty datasets are rejected; large batches, tokens
//!   without a column and tokens split by formatting are reported
//!
//! ## Example
//!
//! ```no_run
//! use rusty_merge::{generate, read_dataset, read_source, Criteria, Template};
//!
//! # fn main() -> Result<(), rusty_merge::RustyMergeError> {
//! let dataset = read_dataset(read_source("clients.xlsx")?, &Criteria::default())?;
//! let template = Template::from_bytes(read_source("letter.docx")?)?;
//! let batch = generate(&dataset, &template)?;
//! std::fs::write("Documents.zip", &batch.archive)?;
//! # Ok(())
//! # }
//! ```
pub mod dataset;
pub mod document;
pub mod error;
mod helpers;
pub mod logging;
pub mod merge;
pub mod spreadsheet;

pub use crate::dataset::value::Value;
pub use crate::dataset::Dataset;
pub use crate::dataset::Record;
pub use crate::document::paragraph::TextRuns;
pub use crate::document::Document;
pub use crate::document::Template;
pub use crate::error::RustyMergeError;
pub use crate::helpers::reader::read_source;
pub use crate::merge::generator::generate;
pub use crate::merge::generator::generate_with;
pub use crate::merge::generator::render_row;
pub use crate::merge::generator::Batch;
pub use crate::merge::generator::RowError;
pub use crate::merge::substitute::substitute;
pub use crate::merge::suggested_archive_name;
pub use crate::merge::validate;
pub use crate::merge::Advisory;
pub use crate::merge::GenerateOptions;
pub use crate::spreadsheet::criteria::Criteria;
pub use crate::spreadsheet::read_dataset;
