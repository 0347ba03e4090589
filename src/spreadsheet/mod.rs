//! # Spreadsheet Module
//!
//! Reads the record source of a merge: an Excel workbook whose first sheet row
//! holds column names and whose following rows hold one record each.
pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod range;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::dataset::Dataset;
use crate::error::RustyMergeError;
use crate::helpers::opc::is_compound_file;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Workbook is password protected or in the legacy binary format; save it as .xlsx")]
    UnsupportedContainerError,

    #[error("Workbook part '{0}' is missing")]
    FileError(String),

    #[error("Workbook contains no worksheets")]
    WorkbookEmptyError,

    #[error("No worksheet matches the requested name (available: {0})")]
    SheetNotFoundError(String),

    #[error("Worksheet '{0}' is empty")]
    EmptySheetError(String),

    #[error("Invalid cell value at '{sheet}'!{reference}: {message}")]
    CellValueError { sheet: String, reference: String, message: String },
}

/// Common interface of workbook formats.
pub(crate) trait Spreadsheet {
    /// Names of the worksheets in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Loads the shared string table referenced by string cells
    fn load_shared_strings(&mut self) -> Result<Vec<String>, RustyMergeError>;

    /// Reads the first worksheet accepted by the criteria
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Sheet, RustyMergeError>;
}

/// Reads a dataset from the bytes of an `.xlsx` workbook.
///
/// The first non-empty row of the selected sheet (inside the optional range)
/// names the columns; every following non-empty row becomes one record.
pub fn read_dataset(bytes: Vec<u8>, criteria: &Criteria) -> Result<Dataset, RustyMergeError> {
    if is_compound_file(&bytes) {
        Err(SpreadsheetError::UnsupportedContainerError)?
    }
    let mut spreadsheet = XlsxSpreadsheet::open(bytes)?;
    let shared_strings = spreadsheet.load_shared_strings()?;
    let sheet = spreadsheet.read_sheet(criteria)?;
    debug!(sheet = %sheet.name, cells = sheet.cells.len(), "worksheet loaded");
    sheet.into_dataset(&shared_strings)
}
