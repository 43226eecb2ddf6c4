//! SQL generation for bulk inserts and range deletes.
//!
//! Values travel as text parameters and are cast server-side to the column's
//! mapped type (`$1::text::BIGINT`). Table and column names are interpolated
//! as given.

use crate::dataset::{Dataset, Value};
use crate::typemap::{column_type_to_postgres, ColumnType};

/// Rows per INSERT statement.
pub const INSERT_PAGE_SIZE: usize = 100;

/// PostgreSQL's limit on bind parameters per statement.
const MAX_PARAMS: usize = u16::MAX as usize;

/// A statement and its positional text parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Option<String>>,
}

impl Statement {
    pub fn simple(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Placeholder casting a text parameter to `column_type`.
fn placeholder(idx: usize, column_type: &ColumnType) -> String {
    format!("${}::text::{}", idx, column_type_to_postgres(column_type))
}

/// Build the multi-row INSERT statements loading every row of `dataset`.
///
/// Rows are split into pages of at most [`INSERT_PAGE_SIZE`] rows (fewer for
/// very wide tables, to stay under the bind parameter limit).
pub fn build_insert_statements(table: &str, dataset: &Dataset) -> Vec<Statement> {
    let columns = dataset.columns();
    if columns.is_empty() || dataset.is_empty() {
        return Vec::new();
    }

    let col_list = dataset.column_names().join(",");
    let page_size = INSERT_PAGE_SIZE.min(MAX_PARAMS / columns.len()).max(1);
    let rows: Vec<Vec<&Value>> = dataset.rows().collect();

    rows.chunks(page_size)
        .map(|page| {
            let mut idx = 1;
            let mut params = Vec::with_capacity(page.len() * columns.len());
            let value_rows: Vec<String> = page
                .iter()
                .map(|row| {
                    let cells: Vec<String> = row
                        .iter()
                        .zip(columns)
                        .map(|(value, col)| {
                            params.push(value.to_param());
                            let p = placeholder(idx, &col.column_type);
                            idx += 1;
                            p
                        })
                        .collect();
                    format!("({})", cells.join(", "))
                })
                .collect();

            Statement {
                sql: format!(
                    "INSERT INTO {}({}) VALUES {}",
                    table,
                    col_list,
                    value_rows.join(", ")
                ),
                params,
            }
        })
        .collect()
}

/// Build a DELETE of the rows whose `column` lies in `[min, max]`.
///
/// The bounds are bound as parameters cast to `bound_type`.
pub fn build_delete_range(
    table: &str,
    column: &str,
    bound_type: &ColumnType,
    min: &Value,
    max: &Value,
) -> Statement {
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} BETWEEN {} AND {}",
            table,
            column,
            placeholder(1, bound_type),
            placeholder(2, bound_type)
        ),
        params: vec![min.to_param(), max.to_param()],
    }
}
