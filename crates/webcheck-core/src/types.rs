//! Shared identifier types.
//!
//! Suite and scenario IDs double as file names and artifact paths, so both
//! are restricted to lowercase alphanumerics with hyphens.

use crate::error::{Result, WebcheckError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Validate slug format: lowercase alphanumeric with hyphens, 3-50 chars.
fn validate_slug(kind: &str, id: &str) -> Result<()> {
    static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SLUG_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,48}[a-z0-9]$").expect("valid regex"));

    if id.len() < 3 || id.len() > 50 {
        return Err(WebcheckError::Validation(format!(
            "invalid {kind} ID: must be 3-50 characters, got {} characters",
            id.len()
        )));
    }

    if regex.is_match(id) {
        Ok(())
    } else {
        Err(WebcheckError::Validation(format!(
            "invalid {kind} ID: must be lowercase alphanumeric with hyphens, got '{id}'"
        )))
    }
}

/// Newtype for suite identifiers with validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SuiteId(String);

impl SuiteId {
    /// Create a new `SuiteId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_slug("suite", &id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SuiteId {
    type Error = WebcheckError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SuiteId> for String {
    fn from(id: SuiteId) -> Self {
        id.0
    }
}

impl fmt::Display for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for scenario identifiers with validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScenarioId(String);

impl ScenarioId {
    /// Create a new `ScenarioId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_slug("scenario", &id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ScenarioId {
    type Error = WebcheckError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ScenarioId> for String {
    fn from(id: ScenarioId) -> Self {
        id.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
