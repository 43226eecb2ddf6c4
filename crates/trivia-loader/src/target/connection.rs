//! Database connection seam and its PostgreSQL implementation.

use std::fmt;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config as PgConfig, NoTls, SimpleQueryMessage};
use tracing::{debug, error, info};

use super::StatementError;
use crate::error::{LoadError, Result};

/// Parameters for opening a connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectParams {
    /// Parameters for a server on `localhost`.
    pub fn new(
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            host: "localhost".to_string(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// `host:port/database`, for logs and error messages.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// An open, exclusively owned database connection.
///
/// Statement failures come back as [`StatementError`] so the loader can
/// decide how to report them.
#[async_trait]
pub trait DbConnection: Send {
    /// Run transaction control statements through the simple query protocol.
    async fn batch(&mut self, sql: &str) -> std::result::Result<(), StatementError>;

    /// Run unparameterised SQL, possibly several `;`-separated statements,
    /// through the simple query protocol and return the affected row count.
    async fn simple(&mut self, sql: &str) -> std::result::Result<u64, StatementError>;

    /// Run one statement with text parameters and return the affected row count.
    async fn execute(
        &mut self,
        sql: &str,
        params: &[Option<String>],
    ) -> std::result::Result<u64, StatementError>;

    /// Release the connection.
    async fn close(self: Box<Self>);
}

/// Opens [`DbConnection`]s.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn DbConnection>>;
}

/// Connector for PostgreSQL via tokio-postgres.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn DbConnection>> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&params.host);
        pg_config.port(params.port);
        pg_config.dbname(&params.database);
        pg_config.user(&params.user);
        pg_config.password(&params.password);

        let (client, connection) = pg_config
            .connect(NoTls)
            .await
            .map_err(|e| LoadError::connection(params.target(), e))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        info!("Connected to PostgreSQL: {}", params.target());
        Ok(Box::new(PgConnection { client, driver }))
    }
}

/// A tokio-postgres client plus the task driving its socket.
pub struct PgConnection {
    client: Client,
    driver: JoinHandle<()>,
}

#[async_trait]
impl DbConnection for PgConnection {
    async fn batch(&mut self, sql: &str) -> std::result::Result<(), StatementError> {
        self.client.batch_execute(sql).await.map_err(StatementError::from)
    }

    async fn simple(&mut self, sql: &str) -> std::result::Result<u64, StatementError> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(StatementError::from)?;
        Ok(messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(rows) => *rows,
                _ => 0,
            })
            .sum())
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: &[Option<String>],
    ) -> std::result::Result<u64, StatementError> {
        let params: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        self.client
            .execute(sql, &params)
            .await
            .map_err(StatementError::from)
    }

    async fn close(self: Box<Self>) {
        let PgConnection { client, driver } = *self;
        // The driver task finishes once the last client handle is gone.
        drop(client);
        if let Err(e) = driver.await {
            debug!("PostgreSQL driver task ended abnormally: {}", e);
        }
    }
}
