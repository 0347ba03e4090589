use crate::error::RustyMergeError;
use crate::spreadsheet::range::Range;
use glob::Pattern;

/// Criteria for selecting the data block of a workbook.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    /// Sheet name pattern; the first matching sheet is read. None selects the first sheet.
    pub(crate) sheet_name_pattern: Option<Pattern>,

    /// Data range within the sheet; its first non-empty row is the header.
    pub(crate) range: Option<Range>,
}

impl Criteria {
    /// Builds criteria from user-supplied option strings.
    pub fn new(sheet_name: Option<&str>, range: Option<&str>) -> Result<Criteria, RustyMergeError> {
        Ok(Criteria {
            sheet_name_pattern: sheet_name.map(Pattern::new).transpose()?,
            range: range.map(Range::try_from).transpose()?,
        })
    }

    /// Checks if a sheet name matches the criteria pattern.
    /// Returns true if no pattern is specified.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        self.sheet_name_pattern
            .as_ref()
            .map(|pattern| pattern.matches(sheet_name))
            .unwrap_or(true)
    }
}
