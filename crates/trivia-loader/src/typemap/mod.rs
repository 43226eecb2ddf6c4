//! Type mapping between dataset column types and PostgreSQL.

use std::fmt;

/// Observed value type of a dataset column.
///
/// The set is closed apart from [`ColumnType::Other`], which carries any tag
/// the mapping does not know. Unknown tags are stored rather than rejected so
/// that schema inference stays total.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int64,
    Int32,
    Float64,
    Float32,
    Bool,
    /// Timestamp without time zone.
    Timestamp,
    /// Timestamp with time zone.
    TimestampTz,
    Interval,
    /// Generic, categorical or string data.
    Text,
    /// Unrecognised type tag.
    Other(String),
}

impl ColumnType {
    /// Parse a dataframe dtype tag such as `int64` or `datetime64[ns, UTC]`.
    ///
    /// Never fails: anything unrecognised becomes [`ColumnType::Other`].
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase();
        match normalized.as_str() {
            "int64" | "bigint" => ColumnType::Int64,
            "int32" | "int" | "integer" => ColumnType::Int32,
            "float64" | "float" | "double" => ColumnType::Float64,
            "float32" | "real" => ColumnType::Float32,
            "bool" | "boolean" => ColumnType::Bool,
            "datetime" | "timestamp" => ColumnType::Timestamp,
            "timedelta" | "interval" => ColumnType::Interval,
            "object" | "category" | "string" | "str" | "text" => ColumnType::Text,
            // Any resolution: [ns], [us], [ms], [s]
            s if s.starts_with("datetime64[") && s.contains(',') => ColumnType::TimestampTz,
            s if s.starts_with("datetime64[") => ColumnType::Timestamp,
            s if s.starts_with("timedelta64[") => ColumnType::Interval,
            _ => ColumnType::Other(tag.to_string()),
        }
    }

    /// PostgreSQL column type for this column type.
    pub fn sql_type(&self) -> &'static str {
        column_type_to_postgres(self)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int64 => f.write_str("int64"),
            ColumnType::Int32 => f.write_str("int32"),
            ColumnType::Float64 => f.write_str("float64"),
            ColumnType::Float32 => f.write_str("float32"),
            ColumnType::Bool => f.write_str("bool"),
            ColumnType::Timestamp => f.write_str("datetime64[ns]"),
            ColumnType::TimestampTz => f.write_str("datetime64[ns, UTC]"),
            ColumnType::Interval => f.write_str("timedelta64[ns]"),
            ColumnType::Text => f.write_str("object"),
            ColumnType::Other(tag) => f.write_str(tag),
        }
    }
}

/// Map a dataset column type to PostgreSQL.
pub fn column_type_to_postgres(column_type: &ColumnType) -> &'static str {
    match column_type {
        // Integer types
        ColumnType::Int64 => "BIGINT",
        ColumnType::Int32 => "INTEGER",

        // Floating point
        ColumnType::Float64 => "DOUBLE PRECISION",
        ColumnType::Float32 => "REAL",

        // Boolean
        ColumnType::Bool => "BOOLEAN",

        // Date/time types
        ColumnType::Timestamp => "TIMESTAMP",
        ColumnType::TimestampTz => "TIMESTAMP WITH TIME ZONE",
        ColumnType::Interval => "INTERVAL",

        // Default fallback
        ColumnType::Text | ColumnType::Other(_) => "TEXT",
    }
}
