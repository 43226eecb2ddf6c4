//! Configuration type definitions.

use std::fmt;

use chrono::{DateTime, Duration, DurationRound, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};
use crate::source::{Difficulty, QuestionType, TriviaQuery, DEFAULT_BASE_URL};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database configuration (PostgreSQL).
    pub database: DatabaseConfig,

    /// Trivia API request configuration.
    #[serde(default)]
    pub trivia: TriviaConfig,

    /// Load behavior configuration.
    #[serde(default)]
    pub load: LoadConfig,
}

/// Target database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host (default: localhost).
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Trivia API request configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriviaConfig {
    /// API base URL (default: https://opentdb.com).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Number of questions per request, 1-50 (default: 10).
    #[serde(default = "default_amount")]
    pub amount: u32,

    /// Category id; all categories if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<u32>,

    /// Difficulty filter; any difficulty if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,

    /// Question type filter; any type if unset.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            amount: default_amount(),
            category: None,
            difficulty: None,
            question_type: None,
        }
    }
}

impl TriviaConfig {
    pub fn query(&self) -> TriviaQuery {
        TriviaQuery {
            amount: self.amount,
            category: self.category,
            difficulty: self.difficulty,
            question_type: self.question_type,
        }
    }
}

/// Load behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Target table (default: trivia_questions).
    #[serde(default = "default_table")]
    pub table: String,

    /// Column stamped with the fetch time on every row (default: timestamp).
    /// Set to null to load the API columns only.
    #[serde(default = "default_stamp_column")]
    pub stamp_column: Option<String>,

    /// Precision of the stamp (default: day). Loads sharing a stamp replace
    /// each other when purging.
    #[serde(default)]
    pub stamp_granularity: StampGranularity,

    /// Delete the range covered by the new rows before inserting (default: false).
    #[serde(default)]
    pub purge_before_load: bool,

    /// Dataset column the purge range is computed from. Defaults to the stamp column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_source_column: Option<String>,

    /// Table column the purge range is matched against. Defaults to the stamp column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_target_column: Option<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            stamp_column: default_stamp_column(),
            stamp_granularity: StampGranularity::default(),
            purge_before_load: false,
            range_source_column: None,
            range_target_column: None,
        }
    }
}

impl LoadConfig {
    /// Effective range source column, if any.
    pub fn range_source(&self) -> Option<&str> {
        self.range_source_column
            .as_deref()
            .or(self.stamp_column.as_deref())
    }

    /// Effective range target column, if any.
    pub fn range_target(&self) -> Option<&str> {
        self.range_target_column
            .as_deref()
            .or(self.stamp_column.as_deref())
    }
}

/// Unit the fetch time is truncated to before it is stamped on the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampGranularity {
    /// Keep the fetch time as is.
    Exact,
    Second,
    Minute,
    Hour,
    #[default]
    Day,
}

impl StampGranularity {
    /// Truncate `at` to this granularity in its own offset.
    pub fn truncate(self, at: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>> {
        let unit = match self {
            StampGranularity::Exact => return Ok(at),
            StampGranularity::Second => Duration::seconds(1),
            StampGranularity::Minute => Duration::minutes(1),
            StampGranularity::Hour => Duration::hours(1),
            StampGranularity::Day => Duration::days(1),
        };
        at.duration_trunc(unit).map_err(|e| {
            LoadError::dataset(format!("cannot truncate {} to {:?}: {}", at, self, e))
        })
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_amount() -> u32 {
    10
}

fn default_table() -> String {
    "trivia_questions".to_string()
}

fn default_stamp_column() -> Option<String> {
    Some("timestamp".to_string())
}
