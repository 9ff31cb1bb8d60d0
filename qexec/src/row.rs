//! Fetched result rows

use std::collections::HashMap;

use crate::error::ValueError;
use crate::traits::FromValue;
use crate::value::Value;

/// One fetched row: column names mapped to values, in result-set order.
///
/// When a result set repeats a column name (e.g. `SELECT a.id, b.id ...`)
/// the name keeps its first position and holds the last value, so each name
/// appears once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    columns: Vec<(String, Value)>,
}

impl ResultRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing an existing column of the same name.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Borrow the raw value of a column.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Read a column as `T`.
    ///
    /// Fails with [`ValueError::ColumnNotFound`] if the row has no such
    /// column. Use `Option<T>` for nullable columns.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, ValueError> {
        let value = self
            .get_value(column)
            .ok_or_else(|| ValueError::ColumnNotFound(column.to_string()))?;
        T::from_value(value.clone())
    }

    /// Whether the row has a column of this name.
    pub fn contains(&self, column: &str) -> bool {
        self.get_value(column).is_some()
    }

    /// Column names in result-set order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over `(column, value)` pairs in result-set order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert into an unordered map.
    pub fn into_map(self) -> HashMap<String, Value> {
        self.columns.into_iter().collect()
    }
}

impl FromIterator<(String, Value)> for ResultRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = ResultRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl IntoIterator for ResultRow {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}
