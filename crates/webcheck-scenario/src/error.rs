//! Error types for the scenario subsystem.

use thiserror::Error;

/// Errors that can occur while loading or validating scenario suites.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Suite not found
    #[error("suite not found: {suite_id}")]
    NotFound {
        /// The suite ID that was not found
        suite_id: String,
    },

    /// Failed to read a suite file
    #[error("failed to load suite from {path}: {source}")]
    LoadError {
        /// Path to the suite file
        path: String,
        /// Underlying error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse suite TOML
    #[error("failed to parse suite TOML in {path}: {source}")]
    ParseError {
        /// Path to the suite file
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Failed to render a suite as TOML
    #[error("failed to serialize suite {suite_id}: {source}")]
    SerializeError {
        /// Suite being serialized
        suite_id: String,
        /// TOML serialization error
        #[source]
        source: toml::ser::Error,
    },

    /// Invalid suite definition (validation failed)
    #[error("invalid suite {suite_id}: {reason}")]
    ValidationError {
        /// Suite ID being validated
        suite_id: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Scenario directory not found
    #[error("scenario directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// I/O error while accessing scenario files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid suite or scenario ID format
    #[error("invalid ID: {0}")]
    InvalidId(#[from] webcheck_core::WebcheckError),
}

/// Result type for scenario operations.
pub type Result<T> = std::result::Result<T, ScenarioError>;
