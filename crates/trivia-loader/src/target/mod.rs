//! PostgreSQL target operations.
//!
//! [`TableLoader`] owns one connection and runs every mutating operation in
//! its own transaction: committed on success, rolled back on failure. A
//! database-side failure is logged and handed back as a
//! [`StatementStatus::RolledBack`] rather than an `Err`; only connection
//! failures and caller misuse come back as [`LoadError`].

mod connection;
#[cfg(test)]
pub(crate) mod fake;
mod sql;

pub use connection::{ConnectParams, Connector, DbConnection, PgConnection, PgConnector};
pub use sql::{build_delete_range, build_insert_statements, Statement, INSERT_PAGE_SIZE};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::dataset::Dataset;
use crate::error::{LoadError, Result};
use crate::typemap::ColumnType;

/// A statement the database refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StatementError {
    pub message: String,
    /// SQLSTATE code, when the server sent one.
    pub code: Option<String>,
}

impl StatementError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

impl From<tokio_postgres::Error> for StatementError {
    fn from(e: tokio_postgres::Error) -> Self {
        let message = match e.as_db_error() {
            Some(db) => db.message().to_string(),
            None => e.to_string(),
        };
        Self {
            message,
            code: e.code().map(|c| c.code().to_string()),
        }
    }
}

/// Outcome of a loader operation that reached the database.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "statement failures are only reported through the returned status"]
pub enum StatementStatus {
    /// The transaction committed; `rows` is the affected row count.
    Committed { rows: u64 },
    /// The transaction was rolled back.
    RolledBack(StatementError),
}

impl StatementStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, StatementStatus::Committed { .. })
    }

    /// Affected rows, if committed.
    pub fn rows(&self) -> Option<u64> {
        match self {
            StatementStatus::Committed { rows } => Some(*rows),
            StatementStatus::RolledBack(_) => None,
        }
    }

    pub fn into_result(self) -> std::result::Result<u64, StatementError> {
        match self {
            StatementStatus::Committed { rows } => Ok(rows),
            StatementStatus::RolledBack(e) => Err(e),
        }
    }
}

enum LoaderState {
    Unconnected,
    Connected(Box<dyn DbConnection>),
    Closed,
}

/// Loads datasets into tables over a single connection.
///
/// `Unconnected -> Connected -> Closed`. Data operations require
/// `Connected`; anything else is a [`LoadError::Precondition`].
pub struct TableLoader {
    params: ConnectParams,
    state: LoaderState,
}

impl TableLoader {
    pub fn new(params: ConnectParams) -> Self {
        Self {
            params,
            state: LoaderState::Unconnected,
        }
    }

    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, LoaderState::Connected(_))
    }

    /// Open the PostgreSQL connection.
    pub async fn connect(&mut self) -> Result<()> {
        self.connect_with(&PgConnector).await
    }

    /// Open the connection through `connector`. Connection errors propagate.
    pub async fn connect_with(&mut self, connector: &dyn Connector) -> Result<()> {
        match self.state {
            LoaderState::Unconnected => {}
            LoaderState::Connected(_) => {
                return Err(LoadError::precondition("loader is already connected"))
            }
            LoaderState::Closed => {
                return Err(LoadError::precondition(
                    "loader has been closed; create a new one to reconnect",
                ))
            }
        }

        let conn = connector.connect(&self.params).await?;
        self.state = LoaderState::Connected(conn);
        Ok(())
    }

    /// Run an arbitrary statement in its own transaction.
    pub async fn execute_query(&mut self, statement: &str) -> Result<StatementStatus> {
        let conn = self.connection("execute_query")?;
        let status = run_in_transaction(conn, &[Statement::simple(statement)]).await;
        match &status {
            StatementStatus::Committed { .. } => info!("executed query: \n\t{}", statement),
            StatementStatus::RolledBack(e) => error!("query failed: {} \n\t{}", e, statement),
        }
        Ok(status)
    }

    /// Create `table` from a `CREATE TABLE IF NOT EXISTS` statement.
    ///
    /// Reissuing the statement for an existing table commits without effect.
    pub async fn create_or_update_schema(
        &mut self,
        table: &str,
        statement: &str,
    ) -> Result<StatementStatus> {
        let status = self.execute_query(statement).await?;
        if status.is_committed() {
            info!("created/updated schema for {}", table);
        }
        Ok(status)
    }

    /// Insert every row of `dataset` into `table`, all or nothing.
    ///
    /// Runs in a transaction of its own, separate from
    /// [`execute_query`](Self::execute_query), paging rows into multi-row
    /// INSERT statements.
    pub async fn bulk_insert(&mut self, dataset: &Dataset, table: &str) -> Result<StatementStatus> {
        let conn = self.connection("bulk_insert")?;

        let statements = build_insert_statements(table, dataset);
        if statements.is_empty() {
            debug!("nothing to insert into {}", table);
            return Ok(StatementStatus::Committed { rows: 0 });
        }

        let status = run_in_transaction(conn, &statements).await;
        match &status {
            StatementStatus::Committed { rows } => {
                info!("inserted {} rows into {}", rows, table)
            }
            StatementStatus::RolledBack(e) => {
                error!("Error: insert into {} rolled back: {}", table, e)
            }
        }
        Ok(status)
    }

    /// Delete rows of `table` whose `target_column` lies within the
    /// inclusive range spanned by `range_column` in `dataset`.
    ///
    /// An empty dataset, or a range column with only NULLs, has no range and
    /// is rejected with [`LoadError::Precondition`]. A missing or unorderable
    /// range column is reported as a rolled-back status like any database
    /// failure.
    pub async fn delete_range(
        &mut self,
        dataset: &Dataset,
        table: &str,
        range_column: &str,
        target_column: &str,
    ) -> Result<StatementStatus> {
        let conn = self.connection("delete_range")?;

        if dataset.is_empty() {
            return Err(LoadError::precondition(format!(
                "cannot derive a delete range for {} from an empty dataset",
                table
            )));
        }

        let range = match dataset.range_of(range_column) {
            Ok(Some(range)) => range,
            Ok(None) => {
                return Err(LoadError::precondition(format!(
                    "column '{}' holds no values to derive a delete range from",
                    range_column
                )))
            }
            Err(e) => {
                error!("delete range on {} failed: {}", table, e);
                return Ok(StatementStatus::RolledBack(StatementError::new(e.to_string())));
            }
        };
        let bound_type = dataset
            .column(range_column)
            .map_or(&ColumnType::Text, |c| &c.column_type);

        let statement = build_delete_range(table, target_column, bound_type, range.min, range.max);
        let status = run_in_transaction(conn, &[statement]).await;
        match &status {
            StatementStatus::Committed { rows } => {
                info!("deleted daterange: {} - {} ({} rows)", range.min, range.max, rows)
            }
            StatementStatus::RolledBack(e) => {
                error!("delete range on {} rolled back: {}", table, e)
            }
        }
        Ok(status)
    }

    /// Release the connection. Fails unless connected.
    pub async fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, LoaderState::Closed) {
            LoaderState::Connected(conn) => {
                conn.close().await;
                debug!("Closed connection to {}", self.params.target());
                Ok(())
            }
            LoaderState::Unconnected => {
                self.state = LoaderState::Unconnected;
                Err(LoadError::precondition("close called before connect"))
            }
            LoaderState::Closed => Err(LoadError::precondition("loader is already closed")),
        }
    }

    fn connection(&mut self, operation: &str) -> Result<&mut dyn DbConnection> {
        match &mut self.state {
            LoaderState::Connected(conn) => Ok(conn.as_mut()),
            LoaderState::Unconnected => Err(LoadError::precondition(format!(
                "{} called before connect",
                operation
            ))),
            LoaderState::Closed => Err(LoadError::precondition(format!(
                "{} called after close",
                operation
            ))),
        }
    }
}

/// Run `statements` between BEGIN and COMMIT, rolling back on the first failure.
async fn run_in_transaction(
    conn: &mut dyn DbConnection,
    statements: &[Statement],
) -> StatementStatus {
    if let Err(e) = conn.batch("BEGIN").await {
        return StatementStatus::RolledBack(e);
    }

    let mut rows = 0u64;
    for statement in statements {
        debug!("{}", statement.sql);
        let result = if statement.params.is_empty() {
            conn.simple(&statement.sql).await
        } else {
            conn.execute(&statement.sql, &statement.params).await
        };
        match result {
            Ok(n) => rows += n,
            Err(e) => {
                rollback(conn).await;
                return StatementStatus::RolledBack(e);
            }
        }
    }

    match conn.batch("COMMIT").await {
        Ok(()) => StatementStatus::Committed { rows },
        Err(e) => {
            rollback(conn).await;
            StatementStatus::RolledBack(e)
        }
    }
}

async fn rollback(conn: &mut dyn DbConnection) {
    if let Err(e) = conn.batch("ROLLBACK").await {
        warn!("rollback failed: {}", e);
    }
}
