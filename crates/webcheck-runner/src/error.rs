use serde::{Deserialize, Serialize};
use thiserror::Error;
use webcheck_browser::BrowserError;
use webcheck_scenario::ScenarioError;

/// Why a single step failed. Every variant ends its scenario.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element not found: {locator} (waited {waited_ms} ms)")]
    ElementNotFound { locator: String, waited_ms: u64 },

    #[error("assertion failed: expected {expected}, got {actual} (waited {waited_ms} ms)")]
    Assertion {
        expected: String,
        actual: String,
        waited_ms: u64,
    },

    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
}

impl StepError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Navigation(_) => FailureKind::Navigation,
            Self::ElementNotFound { .. } => FailureKind::ElementNotFound,
            Self::Assertion { .. } => FailureKind::Assertion,
            Self::Browser(_) => FailureKind::Browser,
        }
    }
}

/// Failure category as it appears in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Navigation,
    ElementNotFound,
    Assertion,
    Browser,
}

/// Errors around a run rather than inside a scenario.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("Report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
