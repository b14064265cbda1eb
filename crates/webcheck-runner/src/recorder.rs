//! Recording a site's pages for offline runs.
//!
//! The recorder opens the start page, follows its same-site links and saves
//! every page it reaches in the layout [`SnapshotDriver`] reads. The pages it
//! saved can seed a suite skeleton with one navigate-and-title scenario each.
//!
//! [`SnapshotDriver`]: webcheck_browser::SnapshotDriver

use crate::error::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::{Position, Url};
use webcheck_browser::{same_site_links, snapshot_file, BrowserActions, BrowserDriver};
use webcheck_core::{ScenarioId, SuiteId};
use webcheck_scenario::{Condition, Scenario, Step, Suite, SuiteMetadata};

/// Links followed from the start page when nothing else is configured.
pub const DEFAULT_MAX_PAGES: usize = 10;

/// A page saved to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedPage {
    pub url: String,
    /// Path relative to the output directory
    pub file: PathBuf,
    pub title: String,
}

/// A link that could not be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPage {
    pub url: String,
    pub error: String,
}

/// Everything one recording produced.
#[derive(Debug, Clone, Serialize)]
pub struct Recording {
    /// Start page; its host and port define the site
    pub site: String,
    /// Saved pages, start page first
    pub pages: Vec<RecordedPage>,
    pub skipped: Vec<SkippedPage>,
}

impl Recording {
    /// Build a suite with one scenario per recorded page.
    ///
    /// Each scenario opens its page and checks the URL and, when the page has
    /// one, the title seen while recording.
    #[must_use]
    pub fn to_suite(&self, id: SuiteId) -> Suite {
        let site = Url::parse(&self.site).ok();
        let base_url = site
            .as_ref()
            .map_or_else(|| self.site.clone(), |url| url.origin().ascii_serialization());
        let host = site
            .as_ref()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.site.clone());

        let mut taken = HashSet::new();
        let scenarios = self
            .pages
            .iter()
            .filter_map(|page| {
                let url = Url::parse(&page.url).ok()?;
                let target = url[Position::BeforePath..].to_string();

                let mut steps = vec![
                    Step::Navigate {
                        url: target.clone(),
                    },
                    Step::Assert {
                        locator: None,
                        nth: None,
                        expect: Condition::UrlMatches {
                            pattern: format!("{}$", regex::escape(&target)),
                        },
                    },
                ];
                if !page.title.is_empty() {
                    steps.push(Step::Assert {
                        locator: None,
                        nth: None,
                        expect: Condition::TitleMatches {
                            pattern: format!("^{}$", regex::escape(&page.title)),
                        },
                    });
                }

                Some(Scenario {
                    id: unique_id(&mut taken, url.path()),
                    name: format!("{} loads", url.path()),
                    steps,
                })
            })
            .collect();

        Suite {
            suite: SuiteMetadata {
                id,
                name: format!("Recorded pages of {host}"),
                base_url,
                description: Some(format!("Generated from a recording of {}", self.site)),
            },
            setup: Vec::new(),
            scenarios,
        }
    }
}

/// Saves a site's pages by following links from a start page.
#[derive(Debug, Clone)]
pub struct Recorder {
    max_pages: usize,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl Recorder {
    /// Follow at most `max_pages` links from the start page.
    #[must_use]
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }

    /// Record `start` and the pages it links to into `out`.
    ///
    /// A start page that cannot be loaded is an error. Linked pages that fail
    /// are listed in [`Recording::skipped`] and the crawl goes on.
    pub async fn record(
        &self,
        driver: &dyn BrowserDriver,
        start: &Url,
        out: &Path,
    ) -> Result<Recording> {
        tracing::info!(%start, out = %out.display(), max_pages = self.max_pages, "recording site");

        let ctx = driver.new_context().await?;
        let recorded = self.crawl(ctx.as_ref(), start, out).await;

        if let Err(e) = ctx.close().await {
            tracing::warn!(error = %e, "failed to close recording context");
        }
        recorded
    }

    async fn crawl(&self, ctx: &dyn BrowserActions, start: &Url, out: &Path) -> Result<Recording> {
        let (home, html) = Self::save(ctx, start, start, out).await?;

        let mut files: HashSet<PathBuf> = HashSet::from([home.file.clone()]);
        let links: Vec<Url> = same_site_links(start, &html)
            .into_iter()
            .filter(|link| match snapshot_file(start, link) {
                Ok(file) => files.insert(file),
                Err(_) => true,
            })
            .take(self.max_pages)
            .collect();
        tracing::debug!(count = links.len(), "following links");

        let mut recording = Recording {
            site: start.to_string(),
            pages: vec![home],
            skipped: Vec::new(),
        };

        for link in links {
            match Self::save(ctx, start, &link, out).await {
                Ok((page, _)) => recording.pages.push(page),
                Err(e) => {
                    tracing::warn!(url = %link, error = %e, "skipping page");
                    recording.skipped.push(SkippedPage {
                        url: link.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            pages = recording.pages.len(),
            skipped = recording.skipped.len(),
            "recording finished"
        );
        Ok(recording)
    }

    /// Load one page and write its HTML below `out`.
    async fn save(
        ctx: &dyn BrowserActions,
        site: &Url,
        url: &Url,
        out: &Path,
    ) -> Result<(RecordedPage, String)> {
        let file = snapshot_file(site, url)?;
        ctx.navigate(url.as_str()).await?;
        let html = ctx.content().await?;
        let title = ctx.title().await.unwrap_or_default();

        let path = out.join(&file);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &html).await?;
        tracing::debug!(%url, file = %path.display(), "saved page");

        Ok((
            RecordedPage {
                url: url.to_string(),
                file,
                title,
            },
            html,
        ))
    }
}

/// Scenario id for a page path: `/` is `page-home`, `/add_remove_elements/`
/// is `page-add-remove-elements`. Repeats get a numeric suffix.
fn unique_id(taken: &mut HashSet<String>, path: &str) -> ScenarioId {
    let mut stem: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        stem = "home".to_string();
    }
    stem.truncate(40);
    let stem = format!("page-{}", stem.trim_end_matches('-'));

    let mut candidate = stem.clone();
    let mut n = 2;
    loop {
        if !taken.contains(&candidate) {
            if let Ok(id) = ScenarioId::new(candidate.clone()) {
                taken.insert(candidate);
                return id;
            }
        }
        candidate = format!("{stem}-{n}");
        n += 1;
    }
}

/// Suite id derived from a host name, e.g. `the-internet-herokuapp-com`.
///
/// `None` when the host does not make a valid slug.
#[must_use]
pub fn suite_id_for(site: &Url) -> Option<SuiteId> {
    let host: String = site
        .host_str()
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();

    SuiteId::new(host.trim_matches('-').to_string()).ok()
}
