use crate::actions::{extract_domain, BrowserActions, BrowserDriver, ElementState};
use crate::error::{BrowserError, Result};
use crate::locator::Locator;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::stream::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use webcheck_core::BrowserConfig;

/// Resolves a `{kind, value}` locator to a list of DOM elements.
const RESOLVE_FN: &str = r"
function (locator) {
  const normalize = (s) => (s || '').replace(/\s+/g, ' ').trim();
  if (locator.kind === 'css') {
    return Array.from(document.querySelectorAll(locator.value));
  }
  const needle = locator.value.toLowerCase();
  const skip = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);
  const matches = (el) =>
    !skip.has(el.tagName) &&
    normalize(el.innerText || el.textContent).toLowerCase().includes(needle);
  const root = document.body || document.documentElement;
  const hits = Array.from(root.querySelectorAll('*')).filter(matches);
  return hits.filter((el) => !Array.from(el.children).some(matches));
}";

const VISIBLE_FN: &str = r"
function (el) {
  const style = window.getComputedStyle(el);
  if (style.display === 'none' || style.visibility === 'hidden') return false;
  const rect = el.getBoundingClientRect();
  return rect.width > 0 && rect.height > 0;
}";

/// Headless Chromium driven over the DevTools protocol.
///
/// One browser process is shared; every context is a separate CDP browser
/// context, so cookies and storage never leak between scenarios.
pub struct BrowserEngine {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch a browser with the given settings
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromiumConfig::builder()
            .window_size(config.window_width, config.window_height)
            .request_timeout(config.navigation_timeout());

        if !config.headless {
            builder = builder.with_head();
        }
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }

        let chromium_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chromium_config).await?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "chromium handler event error");
                }
            }
        });

        tracing::info!(headless = config.headless, "launched chromium");

        Ok(Self {
            browser: Arc::new(browser),
            handler,
            navigation_timeout: config.navigation_timeout(),
        })
    }

    /// Close the browser process and stop the event handler.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(browser) = Arc::get_mut(&mut self.browser) {
            browser.close().await?;
            browser.wait().await.map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        } else {
            tracing::warn!("browser still referenced by open contexts; dropping without close");
        }
        self.handler.abort();
        Ok(())
    }
}

#[async_trait::async_trait]
impl BrowserDriver for BrowserEngine {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn new_context(&self) -> Result<Box<dyn BrowserActions>> {
        let created = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?;
        let context_id = created.result.browser_context_id.clone();

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(BrowserError::ChromiumError)?;
        let page = self.browser.new_page(target).await?;

        tracing::debug!(context = ?context_id, "opened browser context");

        Ok(Box::new(ChromiumContext {
            browser: Arc::clone(&self.browser),
            context_id,
            page,
            navigation_timeout: self.navigation_timeout,
        }))
    }
}

/// A single page inside its own CDP browser context.
struct ChromiumContext {
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    page: Page,
    navigation_timeout: Duration,
}

impl ChromiumContext {
    /// Scripts go out as `Runtime.evaluate` expressions, never as function declarations.
    async fn eval<T: DeserializeOwned>(&self, expression: String) -> Result<T> {
        self.page
            .evaluate_expression(expression)
            .await?
            .into_value()
            .map_err(|e| BrowserError::ChromiumError(format!("unexpected script result: {e}")))
    }

    fn locator_arg(locator: &Locator) -> String {
        let (kind, value) = match locator {
            Locator::Css(selector) => ("css", selector.as_str()),
            Locator::Text(label) => ("text", label.as_str()),
        };
        serde_json::json!({ "kind": kind, "value": value }).to_string()
    }
}

#[async_trait::async_trait]
impl BrowserActions for ChromiumContext {
    async fn navigate(&self, url: &str) -> Result<()> {
        let domain = extract_domain(url)?;
        tracing::debug!(%domain, %url, "navigating");

        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationError(format!("{url}: {e}"))),
            Err(_) => Err(BrowserError::NavigationError(format!(
                "{url}: no load within {:?}",
                self.navigation_timeout
            ))),
        }
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let script = format!(
            "(() => {{ const resolve = {RESOLVE_FN}; const visible = {VISIBLE_FN}; \
             const el = resolve({arg}).find(visible); \
             if (!el) return false; \
             el.scrollIntoView({{ block: 'center' }}); el.click(); return true; }})()",
            arg = Self::locator_arg(locator)
        );

        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound(locator.to_string()))
        }
    }

    async fn current_url(&self) -> Result<String> {
        self.eval("window.location.href".to_string()).await
    }

    async fn title(&self) -> Result<String> {
        self.eval("document.title".to_string()).await
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn query(&self, locator: &Locator) -> Result<Vec<ElementState>> {
        let script = format!(
            "(() => {{ const resolve = {RESOLVE_FN}; const visible = {VISIBLE_FN}; \
             return resolve({arg}).map((el) => ({{ \
               tag: el.tagName.toLowerCase(), \
               text: (el.innerText || el.textContent || '').replace(/\\s+/g, ' ').trim(), \
               visible: visible(el), \
               attributes: Object.fromEntries(Array.from(el.attributes).map((a) => [a.name, a.value])) \
             }})); }})()",
            arg = Self::locator_arg(locator)
        );
        self.eval(script).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn close(&self) -> Result<()> {
        self.page.clone().close().await?;
        self.browser
            .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
            .await?;
        tracing::debug!(context = ?self.context_id, "disposed browser context");
        Ok(())
    }
}
