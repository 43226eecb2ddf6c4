//! In-memory tabular data handed to the loader.
//!
//! A [`Dataset`] is an ordered list of named, typed columns of equal length.
//! Rows are the positional alignment of values across columns. The loader
//! only ever reads a dataset; it never mutates one.

mod value;

pub use value::Value;

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use crate::error::{LoadError, Result};
use crate::typemap::ColumnType;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub values: Vec<Value>,
}

/// Smallest and largest non-NULL value of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange<'a> {
    pub min: &'a Value,
    pub max: &'a Value,
}

/// Ordered collection of equally long columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    ///
    /// Fails if the name is already taken, the length differs from the
    /// existing columns, or a value does not fit the declared type.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        values: Vec<Value>,
    ) -> Result<()> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(LoadError::dataset(format!("duplicate column '{}'", name)));
        }
        if let Some(first) = self.columns.first() {
            if first.values.len() != values.len() {
                return Err(LoadError::dataset(format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    first.values.len()
                )));
            }
        }
        if let Some((row, value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.fits(&column_type))
        {
            return Err(LoadError::dataset(format!(
                "column '{}' is {} but row {} holds {:?}",
                name, column_type, row, value
            )));
        }

        self.columns.push(Column {
            name,
            column_type,
            values,
        });
        Ok(())
    }

    /// Builder form of [`push_column`](Self::push_column).
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        values: Vec<Value>,
    ) -> Result<Self> {
        self.push_column(name, column_type, values)?;
        Ok(self)
    }

    /// Append a column holding the same value in every row.
    pub fn with_constant_column(
        self,
        name: impl Into<String>,
        column_type: ColumnType,
        value: Value,
    ) -> Result<Self> {
        let values = vec![value; self.row_count()];
        self.with_column(name, column_type, values)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Rows as tuples aligned to column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count()).map(move |i| self.columns.iter().map(|c| &c.values[i]).collect())
    }

    /// Minimum and maximum of a column, ignoring NULLs.
    ///
    /// Returns `Ok(None)` when the column holds no non-NULL value and an
    /// error when the column is missing or holds values that cannot be
    /// ordered against each other.
    pub fn range_of(&self, name: &str) -> Result<Option<ValueRange<'_>>> {
        let column = self
            .column(name)
            .ok_or_else(|| LoadError::dataset(format!("no column named '{}'", name)))?;

        let mut range: Option<ValueRange<'_>> = None;
        for value in column.values.iter().filter(|v| !v.is_null()) {
            range = Some(match range {
                None => ValueRange {
                    min: value,
                    max: value,
                },
                Some(r) => {
                    let below = ordering(value, r.min, name)? == Ordering::Less;
                    let above = ordering(value, r.max, name)? == Ordering::Greater;
                    ValueRange {
                        min: if below { value } else { r.min },
                        max: if above { value } else { r.max },
                    }
                }
            });
        }
        Ok(range)
    }

    /// Build a dataset from JSON objects, one per row.
    ///
    /// Columns appear in first-seen key order and missing keys become NULL.
    /// Columns whose values are all booleans, all integers or all numbers get
    /// the matching type; everything else is stored as text, with non-string
    /// values JSON-encoded.
    pub fn from_records(records: &[JsonValue]) -> Result<Self> {
        let mut names: Vec<&str> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let object = record
                .as_object()
                .ok_or_else(|| LoadError::dataset(format!("record {} is not an object", i)))?;
            for key in object.keys() {
                if !names.contains(&key.as_str()) {
                    names.push(key);
                }
            }
        }

        let mut dataset = Dataset::new();
        for name in names {
            let cells: Vec<&JsonValue> = records
                .iter()
                .map(|r| r.get(name).unwrap_or(&JsonValue::Null))
                .collect();
            let column_type = infer_json_type(&cells);
            let values = cells
                .iter()
                .map(|cell| json_to_value(cell, &column_type))
                .collect();
            dataset.push_column(name, column_type, values)?;
        }
        Ok(dataset)
    }
}

fn ordering(a: &Value, b: &Value, column: &str) -> Result<Ordering> {
    a.compare(b).ok_or_else(|| {
        LoadError::dataset(format!(
            "column '{}' mixes values that cannot be ordered: {:?} and {:?}",
            column, a, b
        ))
    })
}

fn infer_json_type(cells: &[&JsonValue]) -> ColumnType {
    let present: Vec<&JsonValue> = cells.iter().copied().filter(|c| !c.is_null()).collect();
    if present.is_empty() {
        ColumnType::Text
    } else if present.iter().all(|c| c.is_boolean()) {
        ColumnType::Bool
    } else if present.iter().all(|c| c.is_i64()) {
        ColumnType::Int64
    } else if present.iter().any(|c| c.is_u64() && !c.is_i64()) {
        // Integers past i64::MAX would lose precision as floats.
        ColumnType::Text
    } else if present.iter().all(|c| c.is_number()) {
        ColumnType::Float64
    } else {
        ColumnType::Text
    }
}

fn json_to_value(cell: &JsonValue, column_type: &ColumnType) -> Value {
    match (cell, column_type) {
        (JsonValue::Null, _) => Value::Null,
        (JsonValue::Bool(b), ColumnType::Bool) => Value::Bool(*b),
        (JsonValue::Number(n), ColumnType::Int64) => n.as_i64().map_or(Value::Null, Value::I64),
        (JsonValue::Number(n), ColumnType::Float64) => n.as_f64().map_or(Value::Null, Value::F64),
        (JsonValue::String(s), _) => Value::Text(s.clone()),
        (other, _) => Value::Text(other.to_string()),
    }
}
