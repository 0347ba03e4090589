use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Timelike;
use std::borrow::Cow;
use thiserror::Error;

/// Largest magnitude below which every integer is exactly representable in an f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992f64;

/// Errors raised when a value cannot be rendered as document text.
#[derive(Error, Debug, PartialEq)]
pub enum ValueError {
    #[error("Unsupported value type '{0}' cannot be rendered as text")]
    UnsupportedTypeError(&'static str),

    #[error("Number '{0}' cannot be rendered as text")]
    NonFiniteNumberError(f64),
}

/// A single dataset cell.
///
/// Spreadsheet cells arrive with heterogeneous types; each variant has one
/// canonical text form so the same dataset always renders the same documents.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Plain text
    Text(String),
    /// Any numeric cell, integral or not
    Number(f64),
    /// Boolean cell
    Boolean(bool),
    /// Calendar date without a time component
    Date(NaiveDate),
    /// Date with time of day
    DateTime(NaiveDateTime),
    /// Time of day without a date
    Time(NaiveTime),
    /// Empty cell
    #[default]
    Missing,
    /// Opaque bytes; never renderable
    Binary(Vec<u8>),
}

impl Value {
    /// Returns the variant name used in diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Time(_) => "time",
            Value::Missing => "missing",
            Value::Binary(_) => "binary",
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Renders the canonical, locale-independent text of the value.
    ///
    /// * Numbers: integral values without a fraction (`42`), others in shortest
    ///   round-trip form (`3.14`)
    /// * Dates: `YYYY-MM-DD`, date-times `YYYY-MM-DD HH:MM:SS`, times `HH:MM:SS`,
    ///   with fractional seconds only when present
    /// * Missing: empty string
    pub fn render(&self) -> Result<Cow<'_, str>, ValueError> {
        let text = match self {
            Value::Text(value) => Cow::Borrowed(value.as_str()),
            Value::Number(value) => Cow::Owned(render_number(*value)?),
            Value::Boolean(value) => Cow::Borrowed(if *value { "true" } else { "false" }),
            Value::Date(value) => Cow::Owned(value.format("%Y-%m-%d").to_string()),
            Value::DateTime(value) if value.nanosecond() == 0 => {
                Cow::Owned(value.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            Value::DateTime(value) => Cow::Owned(value.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::Time(value) if value.nanosecond() == 0 => Cow::Owned(value.format("%H:%M:%S").to_string()),
            Value::Time(value) => Cow::Owned(value.format("%H:%M:%S%.f").to_string()),
            Value::Missing => Cow::Borrowed(""),
            Value::Binary(_) => Err(ValueError::UnsupportedTypeError(self.kind()))?,
        };
        Ok(text)
    }
}

fn render_number(value: f64) -> Result<String, ValueError> {
    if !value.is_finite() {
        Err(ValueError::NonFiniteNumberError(value))
    } else if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        Ok((value as i64).to_string())
    } else {
        Ok(value.to_string())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::Time(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Missing)
    }
}
