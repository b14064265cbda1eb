//! Offline driver backed by recorded HTML pages.
//!
//! Pages are looked up by URL path under a root directory: `/` maps to
//! `index.html`, `/abtest` to `abtest.html`, `/a/b/` to `a/b/index.html`.
//! Only URLs on the recorded host resolve. Clicking follows the `href` of the
//! nearest enclosing anchor; there is no script execution.

use crate::actions::{BrowserActions, BrowserDriver, ElementState};
use crate::error::{BrowserError, Result};
use crate::locator::{normalize_text, Locator};
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use url::Url;

/// Tags that never render content.
const NON_RENDERED: &[&str] = &[
    "head", "script", "style", "template", "noscript", "title", "meta", "link",
];

/// Driver serving recorded pages of a single site.
#[derive(Debug, Clone)]
pub struct SnapshotDriver {
    root: Arc<PathBuf>,
    site: Url,
}

impl SnapshotDriver {
    /// Create a driver for `site_url` serving pages from `root`.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist or the URL has no host.
    pub fn new(root: impl Into<PathBuf>, site_url: &str) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(BrowserError::NavigationError(format!(
                "snapshot directory not found: {}",
                root.display()
            )));
        }

        let site = Url::parse(site_url)
            .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {e}")))?;
        if site.host_str().is_none() {
            return Err(BrowserError::NavigationError("No host in URL".to_string()));
        }

        Ok(Self {
            root: Arc::new(root),
            site,
        })
    }
}

#[async_trait::async_trait]
impl BrowserDriver for SnapshotDriver {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn new_context(&self) -> Result<Box<dyn BrowserActions>> {
        Ok(Box::new(SnapshotContext {
            driver: self.clone(),
            page: Mutex::new(None),
        }))
    }
}

#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    html: String,
}

struct SnapshotContext {
    driver: SnapshotDriver,
    page: Mutex<Option<LoadedPage>>,
}

impl SnapshotContext {
    fn file_for(&self, url: &Url) -> Result<PathBuf> {
        Ok(self.driver.root.join(snapshot_file(&self.driver.site, url)?))
    }

    fn load(&self, url: Url) -> Result<()> {
        let file = self.file_for(&url)?;
        let html = std::fs::read_to_string(&file).map_err(|e| {
            BrowserError::NavigationError(format!("{url}: no snapshot at {}: {e}", file.display()))
        })?;

        tracing::debug!(%url, file = %file.display(), "loaded snapshot page");
        *self.lock_page() = Some(LoadedPage { url, html });
        Ok(())
    }

    fn lock_page(&self) -> std::sync::MutexGuard<'_, Option<LoadedPage>> {
        self.page
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn current(&self) -> Result<LoadedPage> {
        self.lock_page()
            .clone()
            .ok_or_else(|| BrowserError::NavigationError("no page loaded".to_string()))
    }
}

#[async_trait::async_trait]
impl BrowserActions for SnapshotContext {
    async fn navigate(&self, url: &str) -> Result<()> {
        let url = Url::parse(url)
            .map_err(|e| BrowserError::NavigationError(format!("Invalid URL '{url}': {e}")))?;
        self.load(url)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let page = self.current()?;
        let href = {
            let document = Html::parse_document(&page.html);
            let target = resolve(&document, locator)?
                .into_iter()
                .find(is_visible)
                .ok_or_else(|| BrowserError::SelectorNotFound(locator.to_string()))?;
            enclosing_href(target)
        };

        match href {
            Some(href) => {
                let next = page.url.join(&href).map_err(|e| {
                    BrowserError::NavigationError(format!("bad href '{href}': {e}"))
                })?;
                self.load(next)
            }
            None => {
                tracing::debug!(%locator, "clicked element without a link; page unchanged");
                Ok(())
            }
        }
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current()?.url.to_string())
    }

    async fn title(&self) -> Result<String> {
        let page = self.current()?;
        let document = Html::parse_document(&page.html);
        let selector = Selector::parse("title").expect("valid selector");
        Ok(document
            .select(&selector)
            .next()
            .map(|title| normalize_text(&title.text().collect::<String>()))
            .unwrap_or_default())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.current()?.html)
    }

    async fn query(&self, locator: &Locator) -> Result<Vec<ElementState>> {
        let page = self.current()?;
        let document = Html::parse_document(&page.html);
        Ok(resolve(&document, locator)?
            .into_iter()
            .map(element_state)
            .collect())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Err(BrowserError::Unsupported("screenshots of recorded pages".to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.lock_page().take();
        Ok(())
    }
}

/// Snapshot file for `url`, relative to the snapshot root of `site`.
///
/// # Errors
/// Returns [`BrowserError::NavigationError`] for URLs on another host or
/// port, and for paths containing `..`.
pub fn snapshot_file(site: &Url, url: &Url) -> Result<PathBuf> {
    if url.host_str() != site.host_str() || url.port_or_known_default() != site.port_or_known_default()
    {
        return Err(BrowserError::NavigationError(format!(
            "{url} is outside the recorded site {site}"
        )));
    }

    let path = url.path().trim_start_matches('/');
    if path.split('/').any(|segment| segment == "..") {
        return Err(BrowserError::NavigationError(format!("{url}: invalid path")));
    }

    Ok(if path.is_empty() {
        PathBuf::from("index.html")
    } else if path.ends_with('/') {
        Path::new(path).join("index.html")
    } else if Path::new(path).extension().is_some() {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!("{path}.html"))
    })
}

fn resolve<'a>(document: &'a Html, locator: &Locator) -> Result<Vec<ElementRef<'a>>> {
    match locator {
        Locator::Css(css) => {
            let selector = Selector::parse(css)
                .map_err(|e| BrowserError::InvalidLocator(format!("'{css}': {e}")))?;
            Ok(document.select(&selector).collect())
        }
        Locator::Text(label) => {
            let selector = Selector::parse("body *").expect("valid selector");
            let matches = |el: &ElementRef<'_>| {
                !NON_RENDERED.contains(&el.value().name())
                    && Locator::text_matches(label, &el.text().collect::<String>())
            };

            Ok(document
                .select(&selector)
                .filter(|el| matches(el))
                .filter(|el| !el.children().filter_map(ElementRef::wrap).any(|c| matches(&c)))
                .collect())
        }
    }
}

fn is_visible(element: &ElementRef<'_>) -> bool {
    let hidden = |el: &ElementRef<'_>| {
        let value = el.value();
        if NON_RENDERED.contains(&value.name()) || value.attr("hidden").is_some() {
            return true;
        }
        value.attr("style").is_some_and(|style| {
            let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
    };

    !hidden(element)
        && !element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| hidden(&ancestor))
}

fn enclosing_href(element: ElementRef<'_>) -> Option<String> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|el| el.value().name() == "a")
        .and_then(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
}

fn element_state(element: ElementRef<'_>) -> ElementState {
    ElementState {
        tag: element.value().name().to_string(),
        text: normalize_text(&element.text().collect::<String>()),
        visible: is_visible(&element),
        attributes: element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INDEX: &str = r#"<!DOCTYPE html>
<html><head><title>Demo Site</title></head>
<body>
  <h1 class="heading">Welcome</h1>
  <ul>
    <li><a href="/first">First Page</a></li>
    <li><a href="/second"><span>Second</span> Page</a></li>
  </ul>
  <p style="display: none">Hidden note</p>
  <div hidden><a href="/ghost">Ghost</a></div>
</body></html>"#;

    fn site() -> (TempDir, SnapshotDriver) {
        let dir = TempDir::new().expect("create temp dir");
        std::fs::write(dir.path().join("index.html"), INDEX).expect("write index");
        std::fs::write(
            dir.path().join("first.html"),
            "<html><head><title>First</title></head><body><h3>First</h3></body></html>",
        )
        .expect("write first");
        let driver = SnapshotDriver::new(dir.path(), "https://demo.test").expect("driver");
        (dir, driver)
    }

    #[test]
    fn test_snapshot_file_layout() {
        let site = Url::parse("https://the-internet.herokuapp.com").unwrap();
        let file = |url: &str| snapshot_file(&site, &Url::parse(url).unwrap());

        assert_eq!(file("https://the-internet.herokuapp.com").unwrap(), PathBuf::from("index.html"));
        assert_eq!(
            file("https://the-internet.herokuapp.com/abtest").unwrap(),
            PathBuf::from("abtest.html")
        );
        assert_eq!(
            file("https://the-internet.herokuapp.com/add_remove_elements/").unwrap(),
            PathBuf::from("add_remove_elements/index.html")
        );
        assert_eq!(
            file("https://the-internet.herokuapp.com/jqueryui/menu?x=1#top").unwrap(),
            PathBuf::from("jqueryui/menu.html")
        );
        assert!(file("https://elementalselenium.com/").is_err());
        assert!(file("https://the-internet.herokuapp.com:8443/").is_err());
    }

    #[tokio::test]
    async fn test_content_returns_loaded_html() {
        let (_dir, driver) = site();
        let ctx = driver.new_context().await.expect("context");
        assert!(ctx.content().await.is_err());

        ctx.navigate("https://demo.test/").await.expect("navigate");
        assert_eq!(ctx.content().await.unwrap(), INDEX);
    }

    #[tokio::test]
    async fn test_navigate_and_title() {
        let (_dir, driver) = site();
        let ctx = driver.new_context().await.expect("context");

        ctx.navigate("https://demo.test").await.expect("navigate");
        assert_eq!(ctx.title().await.unwrap(), "Demo Site");
        assert_eq!(ctx.current_url().await.unwrap(), "https://demo.test/");
    }

    #[tokio::test]
    async fn test_navigate_unknown_page_fails() {
        let (_dir, driver) = site();
        let ctx = driver.new_context().await.expect("context");

        let err = ctx.navigate("https://demo.test/missing").await.unwrap_err();
        assert!(matches!(err, BrowserError::NavigationError(_)));

        let err = ctx.navigate("https://elsewhere.test/").await.unwrap_err();
        assert!(matches!(err, BrowserError::NavigationError(_)));
    }

    #[tokio::test]
    async fn test_query_css_and_visibility() {
        let (_dir, driver) = site();
        let ctx = driver.new_context().await.expect("context");
        ctx.navigate("https://demo.test/").await.expect("navigate");

        let links = ctx.query(&Locator::parse("ul li a").unwrap()).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].attribute("href"), Some("/first"));
        assert_eq!(links[1].text, "Second Page");

        let hidden = ctx.query(&Locator::parse("p").unwrap()).await.unwrap();
        assert!(!hidden[0].visible);

        let ghost = ctx.query(&Locator::parse("div a").unwrap()).await.unwrap();
        assert!(!ghost[0].visible);
    }

    #[tokio::test]
    async fn test_text_locator_picks_innermost() {
        let (_dir, driver) = site();
        let ctx = driver.new_context().await.expect("context");
        ctx.navigate("https://demo.test/").await.expect("navigate");

        let hits = ctx
            .query(&Locator::parse("text=first page").unwrap())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tag, "a");
    }

    #[tokio::test]
    async fn test_click_follows_enclosing_link() {
        let (_dir, driver) = site();
        let ctx = driver.new_context().await.expect("context");
        ctx.navigate("https://demo.test/").await.expect("navigate");

        ctx.click(&Locator::parse("text=First Page").unwrap())
            .await
            .expect("click");
        assert_eq!(ctx.current_url().await.unwrap(), "https://demo.test/first");
        assert_eq!(ctx.title().await.unwrap(), "First");
    }

    #[tokio::test]
    async fn test_click_hidden_element_not_found() {
        let (_dir, driver) = site();
        let ctx = driver.new_context().await.expect("context");
        ctx.navigate("https://demo.test/").await.expect("navigate");

        let err = ctx.click(&Locator::parse("text=Ghost").unwrap()).await.unwrap_err();
        assert!(matches!(err, BrowserError::SelectorNotFound(_)));
    }

    #[tokio::test]
    async fn test_contexts_are_isolated() {
        let (_dir, driver) = site();
        let first = driver.new_context().await.expect("context");
        let second = driver.new_context().await.expect("context");

        first.navigate("https://demo.test/first").await.expect("navigate");
        assert!(second.current_url().await.is_err());

        first.close().await.expect("close");
        assert!(first.current_url().await.is_err());
    }
}
