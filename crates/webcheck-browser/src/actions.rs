use crate::error::{BrowserError, Result};
use crate::locator::Locator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observed state of one element at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Lowercase tag name
    pub tag: String,
    /// Whitespace-normalised text content
    pub text: String,
    /// Whether the element would be rendered to the user
    pub visible: bool,
    /// Attribute name to value
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementState {
    /// Look up an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Browser actions available inside one isolated browsing context.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to an absolute URL and wait for the page to load
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Click the first visible element matching the locator
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// URL of the current page
    async fn current_url(&self) -> Result<String>;

    /// Title of the current page
    async fn title(&self) -> Result<String>;

    /// Serialized HTML of the current document
    async fn content(&self) -> Result<String>;

    /// Snapshot every element matching the locator, in document order
    async fn query(&self, locator: &Locator) -> Result<Vec<ElementState>>;

    /// Take a PNG screenshot
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Discard the context and everything it holds
    async fn close(&self) -> Result<()>;
}

/// Factory for fresh browsing contexts.
#[async_trait::async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Short driver name used in logs
    fn name(&self) -> &'static str;

    /// Create a context that shares no cookies, storage or history with others
    async fn new_context(&self) -> Result<Box<dyn BrowserActions>>;
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}
