//! # trivia-loader
//!
//! Fetch questions from the Open Trivia DB API and load them into PostgreSQL.
//!
//! The library provides:
//!
//! - **Schema inference** mapping dataset column types to PostgreSQL types
//!   and emitting `CREATE TABLE IF NOT EXISTS`
//! - **Transactional bulk insert** that commits a whole dataset or nothing
//! - **Range purge** deleting the time window a new batch covers
//! - **Trivia API client** turning API responses into datasets
//!
//! ## Example
//!
//! ```rust,no_run
//! use trivia_loader::{infer_schema, ConnectParams, TableLoader, TriviaClient, TriviaQuery};
//!
//! #[tokio::main]
//! async fn main() -> trivia_loader::Result<()> {
//!     let client = TriviaClient::new(trivia_loader::source::DEFAULT_BASE_URL)?;
//!     let questions = client.fetch_questions(&TriviaQuery::new(20)).await?;
//!
//!     let mut loader = TableLoader::new(ConnectParams::new("trivia", "postgres", "secret", 5432));
//!     loader.connect().await?;
//!     let ddl = infer_schema("questions", &questions);
//!     loader.create_or_update_schema("questions", &ddl).await?.into_result()?;
//!     loader.bulk_insert(&questions, "questions").await?.into_result()?;
//!     loader.close().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod orchestrator;
pub mod schema;
pub mod source;
pub mod target;
pub mod typemap;

// Re-exports for convenient access
pub use config::{Config, DatabaseConfig, LoadConfig, StampGranularity, TriviaConfig};
pub use dataset::{Column, Dataset, Value};
pub use error::{LoadError, Result};
pub use orchestrator::{HealthCheckResult, LoadReport, Orchestrator};
pub use schema::infer_schema;
pub use source::{Category, TriviaClient, TriviaQuery};
pub use target::{ConnectParams, StatementError, StatementStatus, TableLoader};
pub use typemap::ColumnType;
