/// Column-name keyed result rows
///
/// A [`Record`] keeps the columns in the order the statement declared them.
/// Column names are unique keys: a repeated name keeps its first position and
/// takes the last value written to it.

use rusqlite::types::Value;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value as JsonValue};

/// One result row mapped by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Set a column, overwriting the value in place if the name is already present
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in declared order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_values(self) -> impl Iterator<Item = Value> {
        self.columns.into_iter().map(|(_, value)| value)
    }

    /// The row as a JSON object
    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .columns
            .iter()
            .map(|(name, value)| (name.clone(), value_to_json(value)))
            .collect();
        JsonValue::Object(map)
    }

    /// Decode the row into a typed struct whose field names match the columns
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::from(*i),
        Value::Real(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Blob(bytes) => JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
    }
}
