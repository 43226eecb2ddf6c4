//! Load orchestrator: fetch questions, create the table, purge, insert.

use std::time::Instant;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::dataset::{Dataset, Value};
use crate::error::{LoadError, Result};
use crate::schema::infer_schema;
use crate::source::{Category, TriviaClient};
use crate::target::{Connector, PgConnector, StatementStatus, TableLoader};
use crate::typemap::ColumnType;

/// Summary of a load run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub schema_statement: String,
    pub rows_fetched: usize,
    /// Rows removed by the purge step, if it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_deleted: Option<u64>,
    pub rows_inserted: u64,
}

impl LoadReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Database reachability as seen by `health-check`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub target: String,
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the fetch-and-load flow described by a [`Config`].
pub struct Orchestrator {
    config: Config,
    client: TriviaClient,
}

impl Orchestrator {
    pub fn new(config: Config) -> Result<Self> {
        let client = TriviaClient::new(&config.trivia.base_url)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// URL of the configured question request.
    pub fn questions_url(&self) -> String {
        self.client.questions_url(&self.config.trivia.query())
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.client.fetch_categories().await
    }

    /// Fetch the configured questions, stamped with the fetch time.
    pub async fn fetch(&self) -> Result<Dataset> {
        let dataset = self.client.fetch_questions(&self.config.trivia.query()).await?;
        self.stamp(dataset, Utc::now().into())
    }

    /// Append the configured stamp column, if any, holding `at` truncated
    /// to the configured granularity.
    pub fn stamp(&self, dataset: Dataset, at: DateTime<FixedOffset>) -> Result<Dataset> {
        match &self.config.load.stamp_column {
            Some(column) => {
                let at = self.config.load.stamp_granularity.truncate(at)?;
                dataset.with_constant_column(column, ColumnType::TimestampTz, Value::TimestampTz(at))
            }
            None => Ok(dataset),
        }
    }

    /// Fetch, then load over a fresh PostgreSQL connection.
    pub async fn run(&self, purge: bool) -> Result<LoadReport> {
        let dataset = self.fetch().await?;
        self.load_with(&PgConnector, &dataset, purge).await
    }

    /// Load `dataset` over a connection from `connector`, closing it afterwards.
    pub async fn load_with(
        &self,
        connector: &dyn Connector,
        dataset: &Dataset,
        purge: bool,
    ) -> Result<LoadReport> {
        let mut loader = TableLoader::new(self.config.database.connect_params());
        loader.connect_with(connector).await?;

        let result = self.load(&mut loader, dataset, purge).await;
        if let Err(e) = loader.close().await {
            warn!("closing loader failed: {}", e);
        }
        result
    }

    /// Create the table, optionally purge the dataset's range, then insert.
    ///
    /// Stops at the first step that rolls back; later steps are not attempted.
    pub async fn load(
        &self,
        loader: &mut TableLoader,
        dataset: &Dataset,
        purge: bool,
    ) -> Result<LoadReport> {
        let table = &self.config.load.table;
        let schema_statement = infer_schema(table, dataset);

        loader
            .create_or_update_schema(table, &schema_statement)
            .await?
            .into_result()?;

        let rows_deleted = if purge {
            let (source, target) = self.range_columns()?;
            Some(checked(loader.delete_range(dataset, table, source, target).await?)?)
        } else {
            None
        };

        let rows_inserted = checked(loader.bulk_insert(dataset, table).await?)?;

        info!(
            "Loaded {} rows into {} ({} fetched)",
            rows_inserted,
            table,
            dataset.row_count()
        );

        Ok(LoadReport {
            table: table.clone(),
            schema_statement,
            rows_fetched: dataset.row_count(),
            rows_deleted,
            rows_inserted,
        })
    }

    /// Connect, run `SELECT 1`, close.
    pub async fn health_check(&self) -> HealthCheckResult {
        self.health_check_with(&PgConnector).await
    }

    pub async fn health_check_with(&self, connector: &dyn Connector) -> HealthCheckResult {
        let params = self.config.database.connect_params();
        let target = params.target();
        let start = Instant::now();

        let mut loader = TableLoader::new(params);
        let outcome = match loader.connect_with(connector).await {
            Ok(()) => {
                let status = loader.execute_query("SELECT 1").await;
                if let Err(e) = loader.close().await {
                    warn!("closing loader failed: {}", e);
                }
                match status {
                    Ok(StatementStatus::Committed { .. }) => None,
                    Ok(StatementStatus::RolledBack(e)) => Some(e.to_string()),
                    Err(e) => Some(e.to_string()),
                }
            }
            Err(e) => Some(e.to_string()),
        };

        HealthCheckResult {
            target,
            connected: outcome.is_none(),
            latency_ms: start.elapsed().as_millis() as u64,
            error: outcome,
        }
    }

    fn range_columns(&self) -> Result<(&str, &str)> {
        match (self.config.load.range_source(), self.config.load.range_target()) {
            (Some(source), Some(target)) => Ok((source, target)),
            _ => Err(LoadError::Config(
                "purge requested but no range columns are configured".into(),
            )),
        }
    }
}

fn checked(status: StatementStatus) -> Result<u64> {
    Ok(status.into_result()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, LoadConfig, StampGranularity, TriviaConfig};
    use crate::target::fake::{FakeConnector, FakeState, RefusingConnector};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn config() -> Config {
        Config {
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "trivia".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
            },
            trivia: TriviaConfig::default(),
            load: LoadConfig::default(),
        }
    }

    fn questions() -> Dataset {
        Dataset::from_records(&[
            json!({"type": "boolean", "difficulty": "easy", "question": "Q1",
                   "correct_answer": "True", "incorrect_answers": ["False"]}),
            json!({"type": "boolean", "difficulty": "easy", "question": "Q2",
                   "correct_answer": "False", "incorrect_answers": ["True"]}),
        ])
        .unwrap()
    }

    fn stamped(orchestrator: &Orchestrator) -> Dataset {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00+00:00").unwrap();
        orchestrator.stamp(questions(), at).unwrap()
    }

    #[test]
    fn test_stamp_adds_timestamptz_column() {
        let orchestrator = Orchestrator::new(config()).unwrap();
        let ds = stamped(&orchestrator);
        let column = ds.column("timestamp").unwrap();
        assert_eq!(column.column_type, ColumnType::TimestampTz);
        assert_eq!(column.values.len(), 2);
    }

    #[test]
    fn test_stamp_truncates_to_granularity() {
        let orchestrator = Orchestrator::new(config()).unwrap();
        let morning = DateTime::parse_from_rfc3339("2024-05-01T10:00:00+02:00").unwrap();
        let later = DateTime::parse_from_rfc3339("2024-05-01T10:05:30+02:00").unwrap();

        let first = orchestrator.stamp(questions(), morning).unwrap();
        let second = orchestrator.stamp(questions(), later).unwrap();
        let midnight = DateTime::parse_from_rfc3339("2024-05-01T00:00:00+02:00").unwrap();
        assert_eq!(
            first.column("timestamp").unwrap().values[0],
            Value::TimestampTz(midnight)
        );
        assert_eq!(
            first.column("timestamp").unwrap().values,
            second.column("timestamp").unwrap().values
        );

        let mut cfg = config();
        cfg.load.stamp_granularity = StampGranularity::Exact;
        let exact = Orchestrator::new(cfg).unwrap().stamp(questions(), later).unwrap();
        assert_eq!(
            exact.column("timestamp").unwrap().values[1],
            Value::TimestampTz(later)
        );
    }

    #[tokio::test]
    async fn test_same_day_reload_purges_previous_stamp() {
        let orchestrator = Orchestrator::new(config()).unwrap();
        let first_at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00+00:00").unwrap();
        let second_at = DateTime::parse_from_rfc3339("2024-05-01T10:05:00+00:00").unwrap();
        let state = Arc::new(Mutex::new(FakeState::default()));

        let first = orchestrator.stamp(questions(), first_at).unwrap();
        let second = orchestrator.stamp(questions(), second_at).unwrap();
        orchestrator
            .load_with(&FakeConnector(state.clone()), &first, false)
            .await
            .unwrap();
        orchestrator
            .load_with(&FakeConnector(state.clone()), &second, true)
            .await
            .unwrap();

        // The purge window of the second load covers the first load's stamp.
        let state = state.lock().unwrap();
        let first_stamp = first.column("timestamp").unwrap().values[0].to_param();
        let delete_params = state
            .log
            .iter()
            .filter(|s| !matches!(s.as_str(), "BEGIN" | "COMMIT" | "ROLLBACK"))
            .zip(&state.params)
            .filter(|(sql, _)| sql.starts_with("DELETE"))
            .map(|(_, params)| params.clone())
            .last()
            .unwrap();
        assert_eq!(delete_params, vec![first_stamp.clone(), first_stamp]);
    }

    #[test]
    fn test_questions_url() {
        let mut cfg = config();
        cfg.trivia.amount = 20;
        cfg.trivia.difficulty = Some(crate::source::Difficulty::Medium);
        let orchestrator = Orchestrator::new(cfg).unwrap();
        assert_eq!(
            orchestrator.questions_url(),
            "https://opentdb.com/api.php?amount=20&difficulty=medium"
        );
    }

    #[tokio::test]
    async fn test_load_creates_purges_and_inserts() {
        let orchestrator = Orchestrator::new(config()).unwrap();
        let ds = stamped(&orchestrator);
        let state = Arc::new(Mutex::new(FakeState::default()));

        let report = orchestrator
            .load_with(&FakeConnector(state.clone()), &ds, true)
            .await
            .unwrap();

        assert_eq!(report.table, "trivia_questions");
        assert_eq!(report.rows_fetched, 2);
        assert!(report.rows_deleted.is_some());
        assert!(report
            .schema_statement
            .ends_with("timestamp TIMESTAMP WITH TIME ZONE)"));

        let state = state.lock().unwrap();
        let statements: Vec<&String> = state
            .log
            .iter()
            .filter(|s| !matches!(s.as_str(), "BEGIN" | "COMMIT"))
            .collect();
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS trivia_questions"));
        assert!(statements[1].starts_with("DELETE FROM trivia_questions WHERE timestamp"));
        assert!(statements[2].starts_with("INSERT INTO trivia_questions(type,difficulty"));
        assert!(state.closed);
    }

    #[tokio::test]
    async fn test_failed_schema_stops_before_insert() {
        let orchestrator = Orchestrator::new(config()).unwrap();
        let ds = stamped(&orchestrator);
        let state = Arc::new(Mutex::new(FakeState::default()));
        state.lock().unwrap().fail_on = Some("CREATE TABLE".into());

        let err = orchestrator
            .load_with(&FakeConnector(state.clone()), &ds, false)
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Statement(_)));

        let state = state.lock().unwrap();
        assert!(!state.log.iter().any(|s| s.starts_with("INSERT")));
        assert!(state.closed);
    }

    #[tokio::test]
    async fn test_purge_without_stamp_column_is_config_error() {
        let mut cfg = config();
        cfg.load.stamp_column = None;
        let orchestrator = Orchestrator::new(cfg).unwrap();
        let state = Arc::new(Mutex::new(FakeState::default()));

        let err = orchestrator
            .load_with(&FakeConnector(state), &questions(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[tokio::test]
    async fn test_health_check_reports_refused_connection() {
        let orchestrator = Orchestrator::new(config()).unwrap();
        let result = orchestrator.health_check_with(&RefusingConnector).await;
        assert!(!result.connected);
        assert!(result.error.unwrap().contains("refused"));
        assert_eq!(result.target, "localhost:5432/trivia");
    }

    #[tokio::test]
    async fn test_health_check_ok() {
        let orchestrator = Orchestrator::new(config()).unwrap();
        let state = Arc::new(Mutex::new(FakeState::default()));
        let result = orchestrator.health_check_with(&FakeConnector(state.clone())).await;
        assert!(result.connected);
        assert!(result.error.is_none());
        assert!(state.lock().unwrap().closed);
    }

    #[test]
    fn test_report_json() {
        let report = LoadReport {
            table: "t".into(),
            schema_statement: "CREATE TABLE IF NOT EXISTS t (id BIGINT)".into(),
            rows_fetched: 3,
            rows_deleted: None,
            rows_inserted: 3,
        };
        let json = report.to_json().unwrap();
        assert!(json.contains("\"rows_inserted\": 3"));
        assert!(!json.contains("rows_deleted"));
    }
}
