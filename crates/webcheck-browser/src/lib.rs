//! Browser drivers for webcheck.
//!
//! Provides headless Chromium control through the DevTools protocol and an
//! offline driver that serves recorded HTML pages. Both hand out isolated
//! contexts implementing [`BrowserActions`].

pub mod actions;
pub mod crawl;
pub mod engine;
pub mod error;
pub mod locator;
pub mod snapshot;

pub use actions::{BrowserActions, BrowserDriver, ElementState};
pub use crawl::same_site_links;
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use locator::{normalize_text, Locator};
pub use snapshot::{snapshot_file, SnapshotDriver};
