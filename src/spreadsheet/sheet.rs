use crate::dataset::value::Value;
use crate::dataset::Dataset;
use crate::error::RustyMergeError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::range::Range;
use crate::spreadsheet::SpreadsheetError;
use std::collections::BTreeMap;
use std::collections::HashSet;

/// Cells of one worksheet restricted to the requested range.
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// Cells in reading order
    pub(crate) cells: Vec<Cell>,
    /// Expected data range (user-specified)
    pub(super) range: Range,
}

impl Sheet {
    pub(super) fn new(name: &str, range: Option<Range>) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            range: range.unwrap_or_default(),
        }
    }

    /// Checks if a cell at (row, col) is within the specified range.
    pub(super) fn contains(&self, row: usize, col: usize) -> bool {
        self.range.contains(row, col)
    }

    /// Checks if a row is after the upper bound of the specified range.
    pub(super) fn after_row_upper_bound(&self, row: usize) -> bool {
        self.range.after_row_upper_bound(row)
    }

    pub(super) fn push(&mut self, cell: Cell) {
        if self.contains(cell.row, cell.col) {
            self.cells.push(cell);
        }
    }

    /// Turns the collected cells into a dataset.
    ///
    /// The first non-empty row is the header. Columns span from the leftmost to
    /// the rightmost populated column (or the range's column bounds when given).
    /// Blank rows between the header and the last populated row are kept as
    /// records of missing values, so record numbers follow the sheet rows.
    /// Trailing blank rows are dropped.
    pub(crate) fn into_dataset(self, shared_strings: &[String]) -> Result<Dataset, RustyMergeError> {
        let mut rows = BTreeMap::<usize, BTreeMap<usize, Value>>::new();
        for cell in &self.cells {
            let value = cell.to_value(shared_strings).map_err(|message| SpreadsheetError::CellValueError {
                sheet: self.name.to_owned(),
                reference: cell.reference(),
                message,
            })?;
            if !value.is_missing() {
                rows.entry(cell.row).or_default().insert(cell.col, value);
            }
        }

        let mut rows = rows.into_iter();
        let (header_row, header) = rows.next().ok_or_else(|| SpreadsheetError::EmptySheetError(self.name.to_owned()))?;
        let col_lower = self.range.col_lower_bound
            .or_else(|| header.keys().next().copied())
            .unwrap_or(0);
        let col_upper = self.range.col_upper_bound
            .or_else(|| header.keys().next_back().copied())
            .unwrap_or(col_lower);
        let mut rows: BTreeMap<usize, BTreeMap<usize, Value>> = rows.collect();
        let col_upper = rows
            .values()
            .filter_map(|row| row.keys().next_back().copied())
            .filter(|_| self.range.col_upper_bound.is_none())
            .fold(col_upper, usize::max);

        let mut dataset = Dataset::new(column_names(&header, col_lower, col_upper)?)?;
        let last_row = rows.keys().next_back().copied().unwrap_or(header_row);
        for row_index in header_row + 1..=last_row {
            let mut row = rows.remove(&row_index).unwrap_or_default();
            let values = (col_lower..=col_upper)
                .map(|col| row.remove(&col).unwrap_or_default())
                .collect();
            dataset.push_row(values)?;
        }
        Ok(dataset)
    }
}

/// Builds unique column names from the header row.
///
/// Blank headers become `Unnamed: <offset>`; repeated names get `.1`, `.2`, ... suffixes.
fn column_names(header: &BTreeMap<usize, Value>, col_lower: usize, col_upper: usize) -> Result<Vec<String>, RustyMergeError> {
    let mut names = Vec::with_capacity(col_upper + 1 - col_lower);
    let mut seen = HashSet::new();
    for col in col_lower..=col_upper {
        let name = match header.get(&col) {
            Some(value) => value.render()?.trim().to_owned(),
            None => String::new(),
        };
        let name = if name.is_empty() {
            format!("Unnamed: {}", col - col_lower)
        } else {
            name
        };
        let mut unique = name.to_owned();
        let mut suffix = 0usize;
        while !seen.insert(unique.to_owned()) {
            suffix += 1;
            unique = format!("{name}.{suffix}");
        }
        names.push(unique);
    }
    Ok(names)
}
