use crate::error::RustyMergeError;
use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// `A1`, `B2:C5`, `A:C`, `2:10` and other partial ranges
static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern"));

/// Errors related to Excel-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// Represents an Excel-style cell range with optional boundaries.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Range {
    /// Lower row bound (0-based index), None for unbounded
    pub(crate) row_lower_bound: Option<usize>,
    /// Upper row bound (0-based index), None for unbounded
    pub(crate) row_upper_bound: Option<usize>,
    /// Lower column bound (0-based index), None for unbounded
    pub(crate) col_lower_bound: Option<usize>,
    /// Upper column bound (0-based index), None for unbounded
    pub(crate) col_upper_bound: Option<usize>,
}

impl Range {
    /// Checks if a cell at (row, col) lies inside the range.
    pub(crate) fn contains(&self, row: usize, col: usize) -> bool {
        self.row_lower_bound.map(|lower| lower <= row).unwrap_or(true)
            && self.row_upper_bound.map(|upper| row <= upper).unwrap_or(true)
            && self.col_lower_bound.map(|lower| lower <= col).unwrap_or(true)
            && self.col_upper_bound.map(|upper| col <= upper).unwrap_or(true)
    }

    /// Checks if every row from `row` onwards is past the range.
    pub(crate) fn after_row_upper_bound(&self, row: usize) -> bool {
        self.row_upper_bound.map(|upper| upper < row).unwrap_or(false)
    }
}

impl TryFrom<&str> for Range {
    type Error = RustyMergeError;

    /// Parses an Excel-style range string (e.g., "A1", "B2:C5", "A:C", "2:10").
    /// Supports single start cells, ranges, and partial ranges (columns or rows only).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim().to_ascii_uppercase();
        let captures = RANGE
            .captures(value.as_str())
            .filter(|_| !value.is_empty() && value != ":")
            .ok_or(RangeError::FormatError(value.to_owned()))?;
        let bound = |index: usize, parse: fn(&str) -> Option<usize>| {
            captures
                .get(index)
                .map(|matcher| matcher.as_str())
                .and_then(parse)
        };
        Ok(Range {
            col_lower_bound: bound(1, col_to_index),
            row_lower_bound: bound(2, row_to_index),
            col_upper_bound: bound(4, col_to_index),
            row_upper_bound: bound(5, row_to_index),
        })
    }
}
