//! Suite, scenario and step types.
//!
//! This module defines the data structures for suites loaded from TOML files.
//! One file holds one suite: its metadata, optional setup steps that run
//! before every scenario, and the scenarios themselves.

use crate::error::{Result, ScenarioError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use url::Url;
use webcheck_browser::Locator;
use webcheck_core::{ScenarioId, SuiteId};

/// Complete suite definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    /// Suite metadata
    pub suite: SuiteMetadata,

    /// Steps run at the start of every scenario
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<Step>,

    /// Scenarios in declaration order
    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    /// Get the suite ID.
    #[must_use]
    pub fn id(&self) -> &SuiteId {
        &self.suite.id
    }

    /// Get the suite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.suite.name
    }

    /// Find a scenario by ID.
    #[must_use]
    pub fn scenario(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| &s.id == id)
    }

    /// Steps to execute for a scenario: the suite's setup followed by the
    /// scenario's own steps.
    pub fn steps_for<'a>(&'a self, scenario: &'a Scenario) -> impl Iterator<Item = &'a Step> {
        self.setup.iter().chain(scenario.steps.iter())
    }

    /// Resolve a `navigate` target against the suite's base URL.
    ///
    /// Absolute URLs are returned unchanged.
    pub fn resolve_url(&self, target: &str) -> Result<String> {
        let base = Url::parse(&self.suite.base_url).map_err(|e| self.invalid(format!(
            "base_url '{}' is not a valid URL: {e}",
            self.suite.base_url
        )))?;

        base.join(target)
            .map(String::from)
            .map_err(|e| self.invalid(format!("cannot resolve '{target}': {e}")))
    }

    /// Replace the base URL, e.g. to point the suite at a local mirror.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.suite.base_url = base_url.into();
        self
    }

    /// Render the suite in the TOML layout the loader reads.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|source| ScenarioError::SerializeError {
            suite_id: self.suite.id.to_string(),
            source,
        })
    }

    /// Validate the suite definition for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        if self.suite.name.trim().is_empty() {
            return Err(self.invalid("suite name cannot be empty"));
        }

        match Url::parse(&self.suite.base_url) {
            Ok(url) if url.has_host() => {}
            Ok(_) => return Err(self.invalid("base_url must have a host")),
            Err(e) => {
                return Err(self.invalid(format!(
                    "base_url '{}' is not a valid URL: {e}",
                    self.suite.base_url
                )))
            }
        }

        for (index, step) in self.setup.iter().enumerate() {
            step.validate()
                .map_err(|reason| self.invalid(format!("setup step {index}: {reason}")))?;
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(&scenario.id) {
                return Err(self.invalid(format!("duplicate scenario id '{}'", scenario.id)));
            }

            if scenario.name.trim().is_empty() {
                return Err(self.invalid(format!("scenario '{}' has an empty name", scenario.id)));
            }

            if self.setup.is_empty() && scenario.steps.is_empty() {
                return Err(self.invalid(format!("scenario '{}' has no steps", scenario.id)));
            }

            for (index, step) in scenario.steps.iter().enumerate() {
                step.validate().map_err(|reason| {
                    self.invalid(format!("scenario '{}' step {index}: {reason}", scenario.id))
                })?;
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> ScenarioError {
        ScenarioError::ValidationError {
            suite_id: self.suite.id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Core suite metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteMetadata {
    /// Unique suite identifier (e.g., "the-internet")
    pub id: SuiteId,

    /// Human-readable suite name
    pub name: String,

    /// URL relative `navigate` targets are resolved against
    pub base_url: String,

    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One independent end-to-end test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario identifier, unique within its suite
    pub id: ScenarioId,

    /// Human-readable scenario name
    pub name: String,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A single scenario step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Load a page, absolute or relative to the suite's base URL
    Navigate {
        /// Target URL or path
        url: String,
    },

    /// Click the first visible element matching the selector
    Click {
        /// Element to click
        selector: Locator,
    },

    /// Check a condition on the page or on located elements
    Assert {
        /// Elements to check; absent for page-level conditions
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locator: Option<Locator>,
        /// Which matched element to check (0-based); the first when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nth: Option<usize>,
        /// Expected condition
        expect: Condition,
    },
}

impl Step {
    /// Check the step is well-formed, returning the reason when it is not.
    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Navigate { url } => {
                if url.trim().is_empty() {
                    return Err("navigate url cannot be empty".to_string());
                }
            }
            Self::Click { .. } => {}
            Self::Assert {
                locator,
                nth,
                expect,
            } => {
                expect.validate()?;

                match (locator, expect.is_page_level()) {
                    (Some(_), true) => {
                        return Err(format!("{} is a page-level condition and takes no locator", expect.kind()));
                    }
                    (None, false) => {
                        return Err(format!("{} requires a locator", expect.kind()));
                    }
                    _ => {}
                }

                if nth.is_some() && expect.is_count() {
                    return Err(format!("{} counts all matches and takes no nth", expect.kind()));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { url } => write!(f, "navigate {url}"),
            Self::Click { selector } => write!(f, "click {selector}"),
            Self::Assert {
                locator,
                nth,
                expect,
            } => {
                write!(f, "assert ")?;
                match (locator, nth) {
                    (Some(locator), Some(nth)) => write!(f, "{locator} [{nth}] ")?,
                    (Some(locator), None) => write!(f, "{locator} ")?,
                    (None, _) => write!(f, "page ")?,
                }
                write!(f, "{expect}")
            }
        }
    }
}

/// Expected condition for an `assert` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "kebab-case")]
pub enum Condition {
    /// Element is rendered
    Visible,
    /// Element text equals the value after whitespace normalisation
    TextEquals {
        /// Expected text
        value: String,
    },
    /// Element text contains the value
    TextContains {
        /// Expected substring
        value: String,
    },
    /// Current URL matches the regex
    UrlMatches {
        /// Regular expression
        pattern: String,
    },
    /// Document title matches the regex
    TitleMatches {
        /// Regular expression
        pattern: String,
    },
    /// Element attribute equals the value
    AttributeEquals {
        /// Attribute name
        name: String,
        /// Expected value
        value: String,
    },
    /// Element attribute exists with a non-empty value
    AttributePresent {
        /// Attribute name
        name: String,
    },
    /// More than `count` elements match
    CountGreaterThan {
        /// Exclusive lower bound
        count: usize,
    },
    /// Exactly `count` elements match
    CountEquals {
        /// Expected number of matches
        count: usize,
    },
}

impl Condition {
    /// Conditions evaluated against the page rather than an element.
    #[must_use]
    pub fn is_page_level(&self) -> bool {
        matches!(self, Self::UrlMatches { .. } | Self::TitleMatches { .. })
    }

    /// Conditions evaluated against the whole match set.
    #[must_use]
    pub fn is_count(&self) -> bool {
        matches!(self, Self::CountGreaterThan { .. } | Self::CountEquals { .. })
    }

    /// Kebab-case condition name as written in TOML.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::TextEquals { .. } => "text-equals",
            Self::TextContains { .. } => "text-contains",
            Self::UrlMatches { .. } => "url-matches",
            Self::TitleMatches { .. } => "title-matches",
            Self::AttributeEquals { .. } => "attribute-equals",
            Self::AttributePresent { .. } => "attribute-present",
            Self::CountGreaterThan { .. } => "count-greater-than",
            Self::CountEquals { .. } => "count-equals",
        }
    }

    /// Compile the regex of a pattern condition.
    ///
    /// Returns `None` for conditions without a pattern.
    pub fn regex(&self) -> Option<std::result::Result<Regex, regex::Error>> {
        match self {
            Self::UrlMatches { pattern } | Self::TitleMatches { pattern } => {
                Some(Regex::new(pattern))
            }
            _ => None,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(Err(e)) = self.regex() {
            return Err(format!("{} pattern does not compile: {e}", self.kind()));
        }

        match self {
            Self::AttributeEquals { name, .. } | Self::AttributePresent { name }
                if name.trim().is_empty() =>
            {
                Err(format!("{} needs an attribute name", self.kind()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => write!(f, "visible"),
            Self::TextEquals { value } => write!(f, "text-equals {value:?}"),
            Self::TextContains { value } => write!(f, "text-contains {value:?}"),
            Self::UrlMatches { pattern } => write!(f, "url-matches /{pattern}/"),
            Self::TitleMatches { pattern } => write!(f, "title-matches /{pattern}/"),
            Self::AttributeEquals { name, value } => {
                write!(f, "attribute-equals {name}={value:?}")
            }
            Self::AttributePresent { name } => write!(f, "attribute-present {name}"),
            Self::CountGreaterThan { count } => write!(f, "count-greater-than {count}"),
            Self::CountEquals { count } => write!(f, "count-equals {count}"),
        }
    }
}
