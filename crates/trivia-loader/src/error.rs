//! Error types for the loader library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for database connection errors.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for caller misuse (wrong loader state, empty dataset, ...).
pub const EXIT_PRECONDITION_ERROR: u8 = 3;
/// Exit code for a statement that was rolled back.
pub const EXIT_STATEMENT_ERROR: u8 = 4;
/// Exit code for malformed datasets.
pub const EXIT_DATASET_ERROR: u8 = 5;
/// Exit code for trivia API failures.
pub const EXIT_API_ERROR: u8 = 6;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for loader operations.
///
/// Statement failures inside [`TableLoader`](crate::target::TableLoader)
/// operations are not reported through this type; they come back as a
/// [`StatementStatus`](crate::target::StatementStatus). The `Statement`
/// variant exists for callers that turn such a status into an error.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Could not open the database connection
    #[error("Connection to {target} failed: {source}")]
    Connection {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation invoked in a state that does not allow it
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Statement rolled back by the database
    #[error("Statement failed: {0}")]
    Statement(#[from] crate::target::StatementError),

    /// Dataset shape or content error
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// HTTP transport error talking to the trivia API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Trivia API answered with a non-zero response code
    #[error("Trivia API error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoadError {
    /// Create a Precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        LoadError::Precondition(message.into())
    }

    /// Create a Connection error for the given target description.
    pub fn connection(
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LoadError::Connection {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Create a Dataset error.
    pub fn dataset(message: impl Into<String>) -> Self {
        LoadError::Dataset(message.into())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            LoadError::Config(_) | LoadError::Yaml(_) => EXIT_CONFIG_ERROR,
            LoadError::Connection { .. } => EXIT_CONNECTION_ERROR,
            LoadError::Precondition(_) => EXIT_PRECONDITION_ERROR,
            LoadError::Statement(_) => EXIT_STATEMENT_ERROR,
            LoadError::Dataset(_) => EXIT_DATASET_ERROR,
            LoadError::Http(_) | LoadError::Api { .. } | LoadError::Json(_) => EXIT_API_ERROR,
            LoadError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(LoadError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(LoadError::precondition("x").exit_code(), EXIT_PRECONDITION_ERROR);
        assert_eq!(LoadError::dataset("x").exit_code(), EXIT_DATASET_ERROR);
        assert_eq!(
            LoadError::Api { code: 5, message: "rate limited".into() }.exit_code(),
            EXIT_API_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(LoadError::from(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.yaml");
        let err = LoadError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error: config.yaml"));
    }
}
