use crate::dataset::value::Value;
use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;

const MILLISECONDS_PER_DAY: i64 = 86_400_000;

/// Workbook epoch used by numeric date cells.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum DateSystem {
    /// Serial 1 is 1900-01-01, including the Lotus 1-2-3 leap year bug
    Excel1900,
    /// Serial 0 is 1904-01-01
    Excel1904,
}

/// Which calendar parts a date-formatted number carries.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Temporal {
    Date,
    DateTime,
    Time,
}

/// Types of cell data in workbook files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as 0/1
    Boolean,
    /// Plain numeric values
    Number,
    /// Numbers displayed through a date or time format
    Temporal(Temporal, DateSystem),
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, system: DateSystem) -> Option<Self> {
        let temporal = match id {
            "22" => Temporal::DateTime,
            "14" | "15" | "16" | "17" => Temporal::Date,
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Temporal::Time,
            _ => return None,
        };
        Some(Self::Temporal(temporal, system))
    }

    /// Parses custom number format strings to determine cell type.
    /// Date and time letters inside quoted literals, escapes and `[...]` blocks are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, system: DateSystem) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::Temporal(Temporal::DateTime, system),
            (true, false) => Self::Temporal(Temporal::Date, system),
            (false, true) => Self::Temporal(Temporal::Time, system),
            (false, false) => Self::Number,
        }
    }
}

/// Represents a single cell in a worksheet with position, type, and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell value as stored in the sheet XML
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw cell into a dataset value.
    ///
    /// Shared strings are resolved against the workbook's shared string table.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<Value, String> {
        let value = match self.kind {
            CellType::Empty => Value::Missing,
            CellType::Boolean => Value::Boolean(self.value == "1" || self.value.eq_ignore_ascii_case("true")),
            CellType::Number => Value::Number(self.to_double()?),
            CellType::Temporal(temporal, system) => {
                let datetime = serial_to_datetime(self.to_double()?, system)
                    .ok_or_else(|| format!("serial '{}' is outside the calendar", self.value))?;
                match temporal {
                    Temporal::Date => Value::Date(datetime.date()),
                    Temporal::DateTime => Value::DateTime(datetime),
                    Temporal::Time => Value::Time(datetime.time()),
                }
            }
            CellType::IsoDateTime => self.to_iso_value()?,
            CellType::InlineString | CellType::Error => Value::Text(self.value.to_owned()),
            CellType::SharedString => {
                let index = self.value
                    .parse::<usize>()
                    .map_err(|_| format!("parse '{}' to shared string index failed", self.value))?;
                let text = shared_strings
                    .get(index)
                    .ok_or_else(|| format!("shared string {index} does not exist"))?;
                Value::Text(text.to_owned())
            }
        };
        Ok(value)
    }

    /// Converts cell value to double-precision floating point.
    fn to_double(&self) -> Result<f64, String> {
        self.value.trim().parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }

    /// Converts an ISO 8601 cell (`t="d"`) into a date or date-time.
    fn to_iso_value(&self) -> Result<Value, String> {
        let value = self.value.trim_end_matches('Z');
        if value.contains('T') {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .map(Value::DateTime)
                .map_err(|_| format!("parse '{}' to NaiveDateTime failed", self.value))
        } else {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| format!("parse '{}' to NaiveDate failed", self.value))
        }
    }
}

/// Converts an Excel serial number into a calendar date-time.
/// Time of day is rounded to the millisecond.
pub(crate) fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let milliseconds = (serial * MILLISECONDS_PER_DAY as f64).round() as i64;
    let days = milliseconds.div_euclid(MILLISECONDS_PER_DAY);
    let time_of_day = milliseconds.rem_euclid(MILLISECONDS_PER_DAY);
    let offset = match system {
        DateSystem::Excel1904 => 1_462,
        // Serial 60 is the non-existent 1900-02-29; earlier serials are shifted by one
        DateSystem::Excel1900 if days < 60 => 1,
        DateSystem::Excel1900 => 0,
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::try_days(days + offset)?)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        (time_of_day / 1_000) as u32,
        ((time_of_day % 1_000) * 1_000_000) as u32,
    )?;
    Some(date.and_time(time))
}
