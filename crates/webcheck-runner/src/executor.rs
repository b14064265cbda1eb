//! Sequential execution of one scenario inside one browser context.
//!
//! Steps run strictly in order and the first failing step ends the
//! scenario. Clicks and assertions poll the page until they succeed or their
//! timeout expires; nothing is retried beyond that polling.

use crate::error::StepError;
use crate::expectation::{Evaluation, Expectation};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use webcheck_browser::{BrowserActions, BrowserError, Locator};
use webcheck_core::RunnerConfig;
use webcheck_scenario::{Condition, Scenario, Step, Suite};

/// The step at which a scenario stopped.
#[derive(Debug)]
pub struct StepFailure {
    /// Position in the executed step list, setup steps included
    pub step_index: usize,
    /// Human-readable step description
    pub step: String,
    /// What went wrong
    pub error: StepError,
}

/// Runs scenario steps against a browser context.
#[derive(Debug, Clone)]
pub struct ScenarioExecutor {
    action_timeout: Duration,
    assertion_timeout: Duration,
    poll_interval: Duration,
}

impl ScenarioExecutor {
    /// Take timeouts and the poll interval from the runner configuration.
    #[must_use]
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            action_timeout: config.action_timeout(),
            assertion_timeout: config.assertion_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Execute the suite's setup steps followed by the scenario's steps.
    pub async fn run(
        &self,
        ctx: &dyn BrowserActions,
        suite: &Suite,
        scenario: &Scenario,
    ) -> Result<(), StepFailure> {
        for (step_index, step) in suite.steps_for(scenario).enumerate() {
            tracing::debug!(
                scenario = %scenario.id,
                step = step_index,
                action = %step,
                "executing step"
            );

            self.execute(ctx, suite, step)
                .await
                .map_err(|error| StepFailure {
                    step_index,
                    step: step.to_string(),
                    error,
                })?;
        }

        Ok(())
    }

    async fn execute(
        &self,
        ctx: &dyn BrowserActions,
        suite: &Suite,
        step: &Step,
    ) -> Result<(), StepError> {
        match step {
            Step::Navigate { url } => {
                let target = suite
                    .resolve_url(url)
                    .map_err(|e| StepError::Navigation(e.to_string()))?;
                ctx.navigate(&target).await.map_err(|e| match e {
                    BrowserError::NavigationError(message) => StepError::Navigation(message),
                    other => StepError::Navigation(other.to_string()),
                })
            }
            Step::Click { selector } => self.click(ctx, selector).await,
            Step::Assert {
                locator,
                nth,
                expect,
            } => self.assert(ctx, locator.as_ref(), *nth, expect).await,
        }
    }

    async fn click(&self, ctx: &dyn BrowserActions, locator: &Locator) -> Result<(), StepError> {
        let started = Instant::now();
        let deadline = started + self.action_timeout;

        loop {
            match until(deadline, ctx.query(locator)).await {
                Ok(elements) if elements.iter().any(|e| e.visible) => {
                    match until(deadline, ctx.click(locator)).await {
                        Ok(()) => return Ok(()),
                        // Element went away, or the click outlived the deadline.
                        Err(BrowserError::SelectorNotFound(_) | BrowserError::Timeout(_)) => {}
                        Err(BrowserError::NavigationError(message)) => {
                            return Err(StepError::Navigation(message))
                        }
                        Err(other) => return Err(StepError::Browser(other)),
                    }
                }
                Ok(_) => {}
                Err(e @ BrowserError::InvalidLocator(_)) => return Err(StepError::Browser(e)),
                Err(e) => tracing::trace!(%locator, error = %e, "query failed while waiting"),
            }

            if Instant::now() >= deadline {
                return Err(StepError::ElementNotFound {
                    locator: locator.to_string(),
                    waited_ms: millis(started.elapsed()),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn assert(
        &self,
        ctx: &dyn BrowserActions,
        locator: Option<&Locator>,
        nth: Option<usize>,
        condition: &Condition,
    ) -> Result<(), StepError> {
        let started = Instant::now();
        let deadline = started + self.assertion_timeout;

        let expected = match (locator, nth) {
            (Some(locator), Some(nth)) => format!("{locator} [{nth}] {condition}"),
            (Some(locator), None) => format!("{locator} {condition}"),
            (None, _) => condition.to_string(),
        };
        let expectation = Expectation::compile(condition).map_err(|e| StepError::Assertion {
            expected: expected.clone(),
            actual: format!("invalid pattern: {e}"),
            waited_ms: 0,
        })?;

        // A call cut off by the deadline keeps the last value observed.
        let mut actual = "nothing observed before the deadline".to_string();
        loop {
            match until(deadline, Self::observe(ctx, locator, nth, &expectation)).await {
                Ok(Evaluation { holds: true, .. }) => return Ok(()),
                Ok(evaluation) => actual = evaluation.actual,
                Err(BrowserError::Timeout(_)) => {}
                Err(e) => actual = format!("error: {e}"),
            }

            if Instant::now() >= deadline {
                return Err(StepError::Assertion {
                    expected,
                    actual,
                    waited_ms: millis(started.elapsed()),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn observe(
        ctx: &dyn BrowserActions,
        locator: Option<&Locator>,
        nth: Option<usize>,
        expectation: &Expectation<'_>,
    ) -> webcheck_browser::Result<Evaluation> {
        match (locator, expectation.condition()) {
            (None, Condition::UrlMatches { .. }) => {
                let url = ctx.current_url().await?;
                Ok(expectation.check_page(&url, ""))
            }
            (None, Condition::TitleMatches { .. }) => {
                let title = ctx.title().await?;
                Ok(expectation.check_page("", &title))
            }
            (Some(locator), _) => {
                let elements = ctx.query(locator).await?;
                Ok(expectation.check_elements(&elements, nth))
            }
            (None, _) => Ok(expectation.check_page("", "")),
        }
    }
}

/// Await one browser call, giving up at the step deadline.
async fn until<T>(
    deadline: Instant,
    call: impl Future<Output = webcheck_browser::Result<T>>,
) -> webcheck_browser::Result<T> {
    tokio::time::timeout_at(deadline, call)
        .await
        .unwrap_or_else(|_| {
            Err(BrowserError::Timeout(
                "no response before the step deadline".to_string(),
            ))
        })
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
