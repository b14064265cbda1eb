//! Suite orchestrator for running scenarios in parallel.
//!
//! This module provides the `SuiteRunner` which gives every scenario its own
//! fresh browser context, bounds how many run at once, enforces the global
//! scenario timeout and collects outcomes into a [`SuiteReport`].

use crate::executor::ScenarioExecutor;
use crate::filter::ScenarioFilter;
use crate::report::{ScenarioOutcome, ScenarioStatus, SuiteReport};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use webcheck_browser::{BrowserActions, BrowserDriver};
use webcheck_core::RunnerConfig;
use webcheck_scenario::{Scenario, Suite};

/// Runs the scenarios of a suite against one driver.
pub struct SuiteRunner {
    /// Source of fresh browser contexts
    driver: Arc<dyn BrowserDriver>,
    /// Step executor shared by all scenarios
    executor: ScenarioExecutor,
    /// Maximum concurrent scenarios
    workers: usize,
    /// Global per-scenario timeout
    scenario_timeout: Duration,
    /// Where failure screenshots go, if anywhere
    artifacts_dir: Option<PathBuf>,
}

impl SuiteRunner {
    /// Create a runner from the `[runner]` configuration section.
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, config: &RunnerConfig) -> Self {
        Self {
            driver,
            executor: ScenarioExecutor::new(config),
            workers: config.workers.max(1),
            scenario_timeout: config.scenario_timeout(),
            artifacts_dir: config.artifacts_dir.clone(),
        }
    }

    /// Run every selected scenario of the suite.
    ///
    /// A failing scenario never stops the others. Outcomes come back in
    /// declaration order whatever order they finished in.
    pub async fn run_suite(&self, suite: &Suite, filter: &ScenarioFilter) -> SuiteReport {
        let started_at = Utc::now();
        let selected: Vec<&Scenario> = suite
            .scenarios
            .iter()
            .filter(|scenario| filter.matches(scenario))
            .collect();

        tracing::info!(
            suite = %suite.id(),
            driver = self.driver.name(),
            scenarios = selected.len(),
            workers = self.workers,
            "running suite"
        );

        let mut futures = FuturesUnordered::new();
        let mut outcomes = Vec::with_capacity(selected.len());

        for (order, scenario) in selected.into_iter().enumerate() {
            futures.push(async move { (order, self.run_scenario(suite, scenario).await) });

            // Respect concurrency limit
            while futures.len() >= self.workers {
                if let Some(result) = futures.next().await {
                    outcomes.push(result);
                }
            }
        }

        // Collect remaining results
        while let Some(result) = futures.next().await {
            outcomes.push(result);
        }

        outcomes.sort_by_key(|(order, _)| *order);

        SuiteReport {
            suite_id: suite.id().to_string(),
            suite_name: suite.name().to_string(),
            driver: self.driver.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        }
    }

    /// Run one scenario in a fresh context, which is closed afterwards.
    pub async fn run_scenario(&self, suite: &Suite, scenario: &Scenario) -> ScenarioOutcome {
        let started = Instant::now();

        let ctx = match self.driver.new_context().await {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!(scenario = %scenario.id, error = %e, "could not open browser context");
                return Self::outcome(
                    scenario,
                    ScenarioStatus::Errored {
                        message: format!("could not open browser context: {e}"),
                    },
                    started,
                );
            }
        };

        let run = self.executor.run(ctx.as_ref(), suite, scenario);
        let status = match tokio::time::timeout(self.scenario_timeout, run).await {
            Ok(Ok(())) => ScenarioStatus::Passed,
            Ok(Err(failure)) => {
                self.capture(ctx.as_ref(), suite, scenario).await;
                ScenarioStatus::Failed {
                    step_index: failure.step_index,
                    step: failure.step,
                    kind: failure.error.kind(),
                    message: failure.error.to_string(),
                }
            }
            Err(_) => {
                self.capture(ctx.as_ref(), suite, scenario).await;
                ScenarioStatus::TimedOut {
                    after_ms: millis(self.scenario_timeout),
                }
            }
        };

        if let Err(e) = ctx.close().await {
            tracing::warn!(scenario = %scenario.id, error = %e, "failed to close browser context");
        }

        let outcome = Self::outcome(scenario, status, started);
        match &outcome.status {
            ScenarioStatus::Passed => tracing::info!(
                scenario = %scenario.id,
                duration_ms = outcome.duration_ms,
                "scenario passed"
            ),
            status => tracing::warn!(
                scenario = %scenario.id,
                duration_ms = outcome.duration_ms,
                ?status,
                "scenario failed"
            ),
        }
        outcome
    }

    /// Save a screenshot of a failed scenario. Never affects the outcome.
    async fn capture(&self, ctx: &dyn BrowserActions, suite: &Suite, scenario: &Scenario) {
        let Some(dir) = &self.artifacts_dir else {
            return;
        };

        let png = match ctx.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(scenario = %scenario.id, error = %e, "no failure screenshot");
                return;
            }
        };

        let suite_dir = dir.join(suite.id().as_str());
        let path = suite_dir.join(format!("{}.png", scenario.id));
        let written = async {
            tokio::fs::create_dir_all(&suite_dir).await?;
            tokio::fs::write(&path, png).await
        }
        .await;

        match written {
            Ok(()) => tracing::info!(path = %path.display(), "saved failure screenshot"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not save screenshot"),
        }
    }

    fn outcome(scenario: &Scenario, status: ScenarioStatus, started: Instant) -> ScenarioOutcome {
        ScenarioOutcome {
            scenario_id: scenario.id.to_string(),
            name: scenario.name.clone(),
            status,
            duration_ms: millis(started.elapsed()),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use webcheck_browser::{BrowserError, ElementState, Locator, Result as BrowserResult};

    /// Driver whose contexts count how many are open at once and close.
    #[derive(Default)]
    struct CountingDriver {
        open: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        fail_contexts: bool,
    }

    struct CountingContext {
        open: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        screenshot: Vec<u8>,
    }

    #[async_trait::async_trait]
    impl BrowserDriver for CountingDriver {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn new_context(&self) -> BrowserResult<Box<dyn BrowserActions>> {
            if self.fail_contexts {
                return Err(BrowserError::ChromiumError("no browser".to_string()));
            }
            let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            Ok(Box::new(CountingContext {
                open: Arc::clone(&self.open),
                closed: Arc::clone(&self.closed),
                screenshot: b"png".to_vec(),
            }))
        }
    }

    #[async_trait::async_trait]
    impl BrowserActions for CountingContext {
        async fn navigate(&self, url: &str) -> BrowserResult<()> {
            if url.ends_with("/slow") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            } else {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Ok(())
        }

        async fn click(&self, _locator: &Locator) -> BrowserResult<()> {
            Ok(())
        }

        async fn current_url(&self) -> BrowserResult<String> {
            Ok("https://demo.test/".to_string())
        }

        async fn title(&self) -> BrowserResult<String> {
            Ok("Demo".to_string())
        }

        async fn content(&self) -> BrowserResult<String> {
            Ok("<html></html>".to_string())
        }

        async fn query(&self, _locator: &Locator) -> BrowserResult<Vec<ElementState>> {
            Ok(Vec::new())
        }

        async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
            Ok(self.screenshot.clone())
        }

        async fn close(&self) -> BrowserResult<()> {
            self.open.fetch_sub(1, Ordering::SeqCst);
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn suite() -> Suite {
        let mut content = String::from(
            "[suite]\nid = \"demo\"\nname = \"Demo\"\nbase_url = \"https://demo.test\"\n",
        );
        for id in ["one", "two", "three", "four", "five"] {
            content.push_str(&format!(
                "\n[[scenario]]\nid = \"{id}\"\nname = \"scenario {id}\"\n\n\
                 [[scenario.steps]]\naction = \"navigate\"\nurl = \"/{id}\"\n"
            ));
        }
        content.push_str(
            "\n[[scenario]]\nid = \"broken\"\nname = \"missing heading\"\n\n\
             [[scenario.steps]]\naction = \"navigate\"\nurl = \"/\"\n\n\
             [[scenario.steps]]\naction = \"assert\"\nlocator = \"h1\"\n\
             expect = { condition = \"visible\" }\n",
        );
        content.push_str(
            "\n[[scenario]]\nid = \"slow\"\nname = \"never loads\"\n\n\
             [[scenario.steps]]\naction = \"navigate\"\nurl = \"/slow\"\n",
        );
        toml::from_str(&content).expect("parse suite")
    }

    fn config() -> RunnerConfig {
        RunnerConfig {
            workers: 2,
            assertion_timeout_ms: 50,
            poll_interval_ms: 10,
            ..RunnerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_outcomes_in_declaration_order_with_isolation() {
        let driver = Arc::new(CountingDriver::default());
        let config = RunnerConfig {
            scenario_timeout_secs: 1,
            ..config()
        };
        let runner = SuiteRunner::new(driver.clone(), &config);

        let report = runner.run_suite(&suite(), &ScenarioFilter::all()).await;

        let ids: Vec<_> = report.outcomes.iter().map(|o| o.scenario_id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two", "three", "four", "five", "broken", "slow"]);
        assert_eq!(report.passed(), 5);
        assert!(matches!(
            report.outcome("broken").unwrap().status,
            ScenarioStatus::Failed { step_index: 1, .. }
        ));
        assert!(matches!(
            report.outcome("slow").unwrap().status,
            ScenarioStatus::TimedOut { after_ms: 1000 }
        ));
        assert_eq!(report.driver, "counting");
    }

    #[tokio::test]
    async fn test_workers_bound_concurrency_and_contexts_close() {
        let driver = Arc::new(CountingDriver::default());
        let runner = SuiteRunner::new(driver.clone(), &config());

        let filter = ScenarioFilter::ids(["one", "two", "three", "four", "five"]);
        let report = runner.run_suite(&suite(), &filter).await;

        assert!(report.all_passed());
        assert_eq!(driver.peak.load(Ordering::SeqCst), 2);
        assert_eq!(driver.closed.load(Ordering::SeqCst), 5);
        assert_eq!(driver.open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_context_failure_is_reported_per_scenario() {
        let driver = Arc::new(CountingDriver {
            fail_contexts: true,
            ..CountingDriver::default()
        });
        let runner = SuiteRunner::new(driver, &config());

        let report = runner
            .run_suite(&suite(), &ScenarioFilter::ids(["one", "two"]))
            .await;

        assert_eq!(report.failed(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.status, ScenarioStatus::Errored { .. })));
    }

    #[tokio::test]
    async fn test_failure_screenshot_saved() {
        let tmp = tempfile::TempDir::new().expect("temp dir");
        let config = RunnerConfig {
            artifacts_dir: Some(tmp.path().to_path_buf()),
            ..config()
        };
        let runner = SuiteRunner::new(Arc::new(CountingDriver::default()), &config);

        let report = runner
            .run_suite(&suite(), &ScenarioFilter::ids(["broken", "one"]))
            .await;

        assert_eq!(report.failed(), 1);
        let shot = tmp.path().join("demo").join("broken.png");
        assert_eq!(std::fs::read(shot).expect("screenshot written"), b"png");
        assert!(!tmp.path().join("demo").join("one.png").exists());
    }
}
