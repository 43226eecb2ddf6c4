//! Schema inference: derive a `CREATE TABLE IF NOT EXISTS` statement from a
//! dataset's column types.

use crate::dataset::Dataset;
use crate::typemap::column_type_to_postgres;

/// Build the DDL for `table` from the columns of `dataset`.
///
/// Pure and infallible. Column order follows the dataset, column types come
/// from [`column_type_to_postgres`], and unknown types fall back to `TEXT`.
/// Works on datasets with zero rows since only declared types are read.
///
/// Identifiers are emitted verbatim; callers must pass trusted names.
pub fn infer_schema(table: &str, dataset: &Dataset) -> String {
    let columns: Vec<String> = dataset
        .columns()
        .iter()
        .map(|col| format!("{} {}", col.name, column_type_to_postgres(&col.column_type)))
        .collect();

    format!("CREATE TABLE IF NOT EXISTS {} ({})", table, columns.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;
    use crate::typemap::ColumnType;

    #[test]
    fn test_mixed_columns() {
        let ds = Dataset::new()
            .with_column("id", ColumnType::Int64, vec![Value::I64(1)])
            .unwrap()
            .with_column("active", ColumnType::Bool, vec![Value::Bool(true)])
            .unwrap()
            .with_column("note", ColumnType::from_tag("object"), vec![Value::Null])
            .unwrap();

        assert_eq!(
            infer_schema("t", &ds),
            "CREATE TABLE IF NOT EXISTS t (id BIGINT, active BOOLEAN, note TEXT)"
        );
    }

    #[test]
    fn test_every_mapped_type() {
        let ds = Dataset::new()
            .with_column("a", ColumnType::Int64, vec![])
            .unwrap()
            .with_column("b", ColumnType::Int32, vec![])
            .unwrap()
            .with_column("c", ColumnType::Float64, vec![])
            .unwrap()
            .with_column("d", ColumnType::Float32, vec![])
            .unwrap()
            .with_column("e", ColumnType::Timestamp, vec![])
            .unwrap()
            .with_column("f", ColumnType::TimestampTz, vec![])
            .unwrap()
            .with_column("g", ColumnType::Interval, vec![])
            .unwrap()
            .with_column("h", ColumnType::Text, vec![])
            .unwrap()
            .with_column("i", ColumnType::Bool, vec![])
            .unwrap();

        assert_eq!(
            infer_schema("events", &ds),
            "CREATE TABLE IF NOT EXISTS events (a BIGINT, b INTEGER, c DOUBLE PRECISION, \
             d REAL, e TIMESTAMP, f TIMESTAMP WITH TIME ZONE, g INTERVAL, h TEXT, i BOOLEAN)"
        );
    }

    #[test]
    fn test_unknown_tag_is_text() {
        let ds = Dataset::new()
            .with_column("shape", ColumnType::from_tag("geojson"), vec![])
            .unwrap();
        assert_eq!(infer_schema("t", &ds), "CREATE TABLE IF NOT EXISTS t (shape TEXT)");
    }

    #[test]
    fn test_one_clause_per_column_in_order() {
        let mut ds = Dataset::new();
        let names = ["zeta", "alpha", "mid", "beta"];
        for name in names {
            ds.push_column(name, ColumnType::Int32, vec![Value::I32(0)]).unwrap();
        }

        let ddl = infer_schema("t", &ds);
        let body = ddl
            .strip_prefix("CREATE TABLE IF NOT EXISTS t (")
            .and_then(|s| s.strip_suffix(')'))
            .unwrap();
        let clauses: Vec<&str> = body.split(", ").collect();
        assert_eq!(clauses.len(), names.len());
        for (clause, name) in clauses.iter().zip(names) {
            assert_eq!(*clause, format!("{} INTEGER", name));
        }
    }
}
