//! Driver selection: live Chromium or recorded snapshots.

use crate::error::Result;
use std::path::PathBuf;
use std::sync::Arc;
use webcheck_browser::{BrowserDriver, BrowserEngine, SnapshotDriver};
use webcheck_core::AppConfig;
use webcheck_scenario::Suite;

/// Produces the driver each suite runs on.
pub enum DriverFactory {
    /// One Chromium process shared by every suite
    Chromium(Arc<BrowserEngine>),
    /// Recorded pages for the suite's site, read from this directory
    Snapshot(PathBuf),
}

impl DriverFactory {
    /// Pick the driver from configuration, launching Chromium if needed.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        if let Some(dir) = &config.suite.offline_dir {
            tracing::info!(dir = %dir.display(), "using recorded pages instead of a browser");
            return Ok(Self::Snapshot(dir.clone()));
        }

        let engine = BrowserEngine::launch(&config.browser).await?;
        Ok(Self::Chromium(Arc::new(engine)))
    }

    /// Driver for one suite.
    pub fn for_suite(&self, suite: &Suite) -> Result<Arc<dyn BrowserDriver>> {
        self.for_site(&suite.suite.base_url)
    }

    /// Driver for pages of the site at `site_url`.
    pub fn for_site(&self, site_url: &str) -> Result<Arc<dyn BrowserDriver>> {
        match self {
            Self::Chromium(engine) => Ok(Arc::clone(engine) as Arc<dyn BrowserDriver>),
            Self::Snapshot(dir) => Ok(Arc::new(SnapshotDriver::new(dir.clone(), site_url)?)),
        }
    }

    /// Release the browser process, if any.
    pub async fn shutdown(self) -> Result<()> {
        match self {
            Self::Chromium(engine) => match Arc::try_unwrap(engine) {
                Ok(engine) => Ok(engine.shutdown().await?),
                Err(_) => {
                    tracing::warn!("browser engine still shared at shutdown; leaving it to drop");
                    Ok(())
                }
            },
            Self::Snapshot(_) => Ok(()),
        }
    }
}
