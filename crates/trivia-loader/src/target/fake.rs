//! In-memory [`DbConnection`] for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ConnectParams, Connector, DbConnection, StatementError};
use crate::error::{LoadError, Result};

/// In-memory connection: statements are staged until COMMIT and dropped on
/// ROLLBACK, so tests can observe what would have been persisted.
#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub(crate) log: Vec<String>,
    pub(crate) staged: Vec<String>,
    pub(crate) committed: Vec<String>,
    pub(crate) params: Vec<Vec<Option<String>>>,
    pub(crate) fail_on: Option<String>,
    pub(crate) fail_at_execute: Option<usize>,
    pub(crate) executes: usize,
    pub(crate) fail_commit: bool,
    pub(crate) closed: bool,
}

impl FakeState {
    fn run(
        &mut self,
        sql: &str,
        params: &[Option<String>],
    ) -> std::result::Result<u64, StatementError> {
        self.log.push(sql.to_string());
        self.params.push(params.to_vec());
        let call = self.executes;
        self.executes += 1;
        let matches_pattern = self
            .fail_on
            .as_deref()
            .is_some_and(|pattern| sql.contains(pattern));
        if matches_pattern || self.fail_at_execute == Some(call) {
            return Err(StatementError {
                message: "null value in column violates not-null constraint".into(),
                code: Some("23502".into()),
            });
        }
        self.staged.push(sql.to_string());
        // One "row" per bound parameter keeps the arithmetic visible.
        Ok(params.len() as u64)
    }
}

pub(crate) struct FakeConnection(pub(crate) Arc<Mutex<FakeState>>);

#[async_trait]
impl DbConnection for FakeConnection {
    async fn batch(&mut self, sql: &str) -> std::result::Result<(), StatementError> {
        let mut state = self.0.lock().unwrap();
        state.log.push(sql.to_string());
        match sql {
            "COMMIT" if state.fail_commit => {
                return Err(StatementError {
                    message: "could not serialize access due to concurrent update".into(),
                    code: Some("40001".into()),
                });
            }
            "COMMIT" => {
                let staged = std::mem::take(&mut state.staged);
                state.committed.extend(staged);
            }
            "ROLLBACK" => state.staged.clear(),
            _ => {}
        }
        Ok(())
    }

    async fn simple(&mut self, sql: &str) -> std::result::Result<u64, StatementError> {
        self.0.lock().unwrap().run(sql, &[])
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: &[Option<String>],
    ) -> std::result::Result<u64, StatementError> {
        self.0.lock().unwrap().run(sql, params)
    }

    async fn close(self: Box<Self>) {
        self.0.lock().unwrap().closed = true;
    }
}

pub(crate) struct FakeConnector(pub(crate) Arc<Mutex<FakeState>>);

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _params: &ConnectParams) -> Result<Box<dyn DbConnection>> {
        Ok(Box::new(FakeConnection(self.0.clone())))
    }
}

pub(crate) struct RefusingConnector;

#[async_trait]
impl Connector for RefusingConnector {
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn DbConnection>> {
        Err(LoadError::connection(
            params.target(),
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        ))
    }
}
