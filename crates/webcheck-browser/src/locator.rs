//! Element locators.
//!
//! A locator is written as a single string. `text=<label>` selects the
//! innermost elements whose visible text contains the label (case-insensitive,
//! whitespace-normalised); anything else is treated as a CSS selector.

use crate::error::{BrowserError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const TEXT_PREFIX: &str = "text=";

/// A query identifying zero or more elements on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    /// CSS selector, e.g. `#page-footer a`
    Css(String),
    /// Text label, e.g. `text=Form Authentication`
    Text(String),
}

impl Locator {
    /// Parse a locator string, checking CSS syntax.
    ///
    /// # Errors
    /// Returns [`BrowserError::InvalidLocator`] for empty input, an empty text
    /// label or an unparseable CSS selector.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(BrowserError::InvalidLocator("locator cannot be empty".to_string()));
        }

        if let Some(label) = input.strip_prefix(TEXT_PREFIX) {
            let label = normalize_text(label);
            if label.is_empty() {
                return Err(BrowserError::InvalidLocator(format!(
                    "text locator has an empty label: '{input}'"
                )));
            }
            return Ok(Self::Text(label));
        }

        scraper::Selector::parse(input)
            .map_err(|e| BrowserError::InvalidLocator(format!("'{input}': {e}")))?;
        Ok(Self::Css(input.to_string()))
    }

    /// Whether an element's text satisfies a `text=` label.
    #[must_use]
    pub fn text_matches(label: &str, text: &str) -> bool {
        normalize_text(text)
            .to_lowercase()
            .contains(&label.to_lowercase())
    }
}

impl TryFrom<String> for Locator {
    type Error = BrowserError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "{selector}"),
            Self::Text(label) => write!(f, "{TEXT_PREFIX}{label}"),
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
