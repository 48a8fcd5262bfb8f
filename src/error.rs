//! Error types for the scorecard library

use thiserror::Error;

/// Result type alias for scorecard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced at the boundary of the scoring engine.
///
/// The engine itself never fails; these cover reading evidence documents
/// and validating configured scoring tables.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while reading evidence
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Evidence document contained no families
    #[error("Invalid input: no assessment data provided")]
    EmptyAssessment,

    /// Evidence document does not have the expected shape
    #[error("Invalid input: {0}")]
    MalformedEvidence(String),

    /// Scoring tables violate a table invariant
    #[error("Invalid scoring tables: {0}")]
    InvalidTables(String),
}

impl Error {
    /// Create a new malformed evidence error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedEvidence(msg.into())
    }

    /// Create a new invalid tables error
    pub fn invalid_tables(msg: impl Into<String>) -> Self {
        Self::InvalidTables(msg.into())
    }

    /// Whether this error is the caller's fault (bad input shape)
    pub fn is_bad_input(&self) -> bool {
        matches!(self, Error::EmptyAssessment | Error::MalformedEvidence(_))
    }
}
