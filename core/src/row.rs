//! Row materialization: typed records or ordered column -> value mappings.
//!
//! Drivers fully buffer a result set into [`Rows`] before the connection goes
//! back to the pool, so nothing here borrows from a live statement.

use hashbrown::HashMap;

use crate::error::Result;
use crate::record::Record;
use crate::value::{FromValue, Value};

/// A buffered result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    columns: Vec<String>,
    data: Vec<Vec<Value>>,
}

impl Rows {
    /// Every row in `data` must have one value per column.
    pub fn new(columns: Vec<String>, data: Vec<Vec<Value>>) -> Self {
        debug_assert!(data.iter().all(|row| row.len() == columns.len()));
        Self { columns, data }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Row<'_>> {
        self.data.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.data.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// One ordered mapping per row.
    pub fn maps(self) -> Vec<RowMap> {
        let Rows { columns, data } = self;
        data.into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect()
    }

    /// The first row as a mapping.
    pub fn first_map(self) -> Option<RowMap> {
        self.maps().into_iter().next()
    }

    /// Column positions plus every cell rendered as text (NULL becomes "").
    pub fn grid(&self) -> (HashMap<String, usize>, Vec<Vec<String>>) {
        let index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let cells = self
            .data
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| match v {
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect();
        (index, cells)
    }

    /// Materializes every row into `T`. Columns unknown to `T` are ignored.
    pub fn records<T: Record>(self) -> Result<Vec<T>> {
        let Rows { columns, data } = self;
        data.into_iter()
            .map(|values| {
                let mut record = T::default();
                for (column, value) in columns.iter().zip(values) {
                    record.set(column, value)?;
                }
                Ok(record)
            })
            .collect()
    }
}

/// A borrowed view of one buffered row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn get_at(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Reads and converts a column; a missing column reads as NULL.
    pub fn get_as<T: FromValue>(&self, column: &str) -> Result<T> {
        T::from_value(self.get(column).cloned().unwrap_or_default())
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

/// Ordered column -> value mapping. Insertion order is preserved and a key
/// appears at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    entries: Vec<(String, Value)>,
}

impl RowMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces in place, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder form of [`RowMap::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let at = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(at).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Text form of a cell, "" for NULL or missing keys.
    pub fn string(&self, key: &str) -> String {
        match self.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(v) => v.to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RowMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RowMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for RowMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for RowMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RowMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
