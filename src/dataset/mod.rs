//! # Dataset Module
//!
//! Tabular records feeding the merge: an ordered list of rows sharing one fixed
//! set of named columns. Column names double as placeholder keys.
pub mod value;

use crate::dataset::value::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while assembling a dataset.
#[derive(Error, Debug, PartialEq)]
pub enum DatasetError {
    #[error("Duplicate column name '{0}'")]
    DuplicateColumnError(String),

    #[error("Unknown column name '{0}'")]
    UnknownColumnError(String),

    #[error("Row {row} has {actual} values but the dataset has {expected} columns")]
    RowWidthError { row: usize, expected: usize, actual: usize },
}

/// Ordered rows over a fixed list of columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Creates an empty dataset with the given column names.
    pub fn new<I, S>(columns: I) -> Result<Dataset, DatasetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(DatasetError::DuplicateColumnError(column.to_owned()));
            }
        }
        Ok(Dataset { columns, rows: Vec::new() })
    }

    /// Column names in spreadsheet order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row given positionally; the width must match the columns.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<(), DatasetError> {
        if values.len() != self.columns.len() {
            return Err(DatasetError::RowWidthError {
                row: self.rows.len() + 1,
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    /// Appends a row given as `(column, value)` pairs. Columns not mentioned are missing.
    pub fn push_record<I, K, V>(&mut self, pairs: I) -> Result<(), DatasetError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut values = vec![Value::Missing; self.columns.len()];
        for (key, value) in pairs {
            let key = key.as_ref();
            let index = self.position(key)
                .ok_or_else(|| DatasetError::UnknownColumnError(key.to_owned()))?;
            values[index] = value.into();
        }
        self.rows.push(values);
        Ok(())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == key)
    }

    /// Iterates rows in order.
    pub fn records(&self) -> impl ExactSizeIterator<Item = Record<'_>> + '_ {
        self.rows.iter().enumerate().map(|(index, values)| Record {
            index,
            columns: &self.columns,
            values,
        })
    }
}

/// A borrowed view of one dataset row.
#[derive(Copy, Clone, Debug)]
pub struct Record<'a> {
    /// Row index (0-based)
    pub index: usize,
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Row number as shown to users and used in output names (1-based).
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Looks a value up by column name.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|column| column == key)
            .map(|index| &self.values[index])
    }

    /// Iterates `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_columns_are_rejected() {
        assert_eq!(
            Dataset::new(["Name", "Name"]).unwrap_err(),
            DatasetError::DuplicateColumnError("Name".to_owned())
        );
    }

    #[test]
    fn push_row_checks_width() {
        let mut dataset = Dataset::new(["Name", "City"]).unwrap();
        dataset.push_row(vec![Value::from("Ana"), Value::from("Lima")]).unwrap();
        assert_eq!(
            dataset.push_row(vec![Value::from("Luis")]),
            Err(DatasetError::RowWidthError { row: 2, expected: 2, actual: 1 })
        );
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn push_record_fills_missing_columns() {
        let mut dataset = Dataset::new(["Name", "City"]).unwrap();
        dataset.push_record([("City", "Quito")]).unwrap();
        let record = dataset.records().next().unwrap();
        assert_eq!(record.get("Name"), Some(&Value::Missing));
        assert_eq!(record.get("City"), Some(&Value::from("Quito")));
        assert_eq!(record.get("Country"), None);

        assert_eq!(
            dataset.push_record([("Country", "Peru")]),
            Err(DatasetError::UnknownColumnError("Country".to_owned()))
        );
    }

    #[test]
    fn records_keep_order_and_numbering() {
        let mut dataset = Dataset::new(["Name"]).unwrap();
        for name in ["Ana", "Luis", "Zoe"] {
            dataset.push_record([("Name", name)]).unwrap();
        }
        let numbers: Vec<(usize, String)> = dataset
            .records()
            .map(|record| (record.number(), record.get("Name").unwrap().render().unwrap().into_owned()))
            .collect();
        assert_eq!(numbers, vec![(1, "Ana".to_owned()), (2, "Luis".to_owned()), (3, "Zoe".to_owned())]);
    }

    #[test]
    fn record_iterates_in_column_order() {
        let mut dataset = Dataset::new(["A", "B"]).unwrap();
        dataset.push_row(vec![Value::from(1_i64), Value::Missing]).unwrap();
        let record = dataset.records().next().unwrap();
        let keys: Vec<&str> = record.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }
}
