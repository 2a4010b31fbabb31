//! Error taxonomy shared by all checks.

use thiserror::Error;

/// Errors that abort a check invocation.
#[derive(Error, Debug)]
pub enum CheckError {
    /// Missing or invalid instance settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The target does not meet the version or schema preconditions.
    #[error("{0}")]
    Eligibility(String),

    /// A fixed query or command returned data in an unexpected shape.
    #[error("Unexpected data: {0}")]
    DataShape(String),

    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckError {
    /// Wrap an error coming from a database client.
    pub fn database<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        CheckError::Database(err.into())
    }
}
