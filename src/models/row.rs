//! Column-indexed rows handed from the store reader to plugins.

use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::types::Value;

static NULL: Value = Value::Null;

/// Maps result column names to their positions for one query shape.
///
/// Built once from the prepared statement and shared by every row the
/// statement yields.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let positions = names
            .into_iter()
            .enumerate()
            .map(|(position, name)| (name.into(), position))
            .collect();
        Self { positions }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
}

/// One denormalized result row.
#[derive(Debug, Clone)]
pub struct SourceRow {
    columns: Arc<ColumnIndex>,
    values: Vec<Value>,
}

impl SourceRow {
    pub fn new(columns: Arc<ColumnIndex>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Builds a row from name/value pairs, mostly useful in tests.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .unzip();
        Self::new(Arc::new(ColumnIndex::new(names)), values)
    }

    /// Value of the named column. Columns missing from the query shape read
    /// as `Null`.
    pub fn get(&self, name: &str) -> &Value {
        self.columns
            .position(name)
            .and_then(|position| self.values.get(position))
            .unwrap_or(&NULL)
    }
}

/// Short human-readable rendering of a column value for diagnostics.
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => format!("integer {v}"),
        Value::Real(v) => format!("real {v}"),
        Value::Text(v) => format!("text '{v}'"),
        Value::Blob(v) => format!("blob of {} bytes", v.len()),
    }
}
