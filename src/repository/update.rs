/// Minimal-diff UPDATE statements
///
/// Column names only ever come from `&'static str` constants in this crate;
/// every value travels as a bound parameter.

use rusqlite::types::Value;

use crate::domain::{HabitChanges, HabitId};

/// Stored timestamp format: RFC 3339 with milliseconds
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%fZ";

/// SQL expression for the next value of a timestamp column
///
/// The current time, or one millisecond past the stored value when the clock
/// has not moved on since the last write. The text form sorts like the instant.
pub(crate) fn advance_timestamp(column: &str) -> String {
    format!(
        "max(strftime('{fmt}', 'now'), strftime('{fmt}', julianday({column}) + 1.0 / 86400000))",
        fmt = TIMESTAMP_FORMAT,
        column = column
    )
}

/// Collects `column = ?` assignments for one row
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<(&'static str, Value)>,
    touch: Option<&'static str>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            touch: None,
        }
    }

    /// Assign a column
    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.assignments.push((column, value.into()));
        self
    }

    /// Assign a column only when a value was supplied
    pub fn set_if<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    /// Refresh a timestamp column whenever the statement runs
    pub fn touch(mut self, column: &'static str) -> Self {
        self.touch = Some(column);
        self
    }

    /// Columns that will be assigned from parameters
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.assignments.iter().map(|(column, _)| *column)
    }

    /// True when no supplied field would be written
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Render `UPDATE table SET ... WHERE key_column = ?`
    pub fn build(self, key_column: &'static str, key: impl Into<Value>) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = self
            .assignments
            .iter()
            .enumerate()
            .map(|(index, (column, _))| format!("{} = ?{}", column, index + 1))
            .collect();
        if let Some(column) = self.touch {
            clauses.push(format!("{} = {}", column, advance_timestamp(column)));
        }

        let key_index = self.assignments.len() + 1;
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            self.table,
            clauses.join(", "),
            key_column,
            key_index
        );

        let mut params: Vec<Value> = self.assignments.into_iter().map(|(_, value)| value).collect();
        params.push(key.into());
        (sql, params)
    }
}

/// Build the update for a habit, touching only the supplied fields
pub fn habit_update(changes: &HabitChanges) -> UpdateBuilder {
    UpdateBuilder::new("habits")
        .set_if("name", changes.name.clone())
        .set_if("description", changes.description.clone())
        .set_if("color", changes.color.clone())
        .set_if("icon", changes.icon.clone())
        .set_if("frequency", changes.frequency.map(|f| f.as_str().to_string()))
        .set_if("target_days", changes.target_days)
        .set_if("is_active", changes.is_active)
        .touch("updated_at")
}

/// Render the habit update for one id
pub fn habit_update_statement(id: HabitId, changes: &HabitChanges) -> (String, Vec<Value>) {
    habit_update(changes).build("id", id)
}
