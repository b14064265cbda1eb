//! Run results and their text/JSON rendering.

use crate::error::{FailureKind, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Final state of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ScenarioStatus {
    Passed,
    /// A step failed; later steps did not run
    Failed {
        step_index: usize,
        step: String,
        kind: FailureKind,
        message: String,
    },
    /// The scenario exceeded the global timeout
    TimedOut { after_ms: u64 },
    /// No browser context could be created
    Errored { message: String },
}

impl ScenarioStatus {
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed { .. } => "FAIL",
            Self::TimedOut { .. } => "TIME",
            Self::Errored { .. } => "ERR ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario_id: String,
    pub name: String,
    #[serde(flatten)]
    pub status: ScenarioStatus,
    pub duration_ms: u64,
}

/// Outcomes of one suite, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite_id: String,
    pub suite_name: String,
    pub driver: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_passed()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    #[must_use]
    pub fn outcome(&self, scenario_id: &str) -> Option<&ScenarioOutcome> {
        self.outcomes.iter().find(|o| o.scenario_id == scenario_id)
    }
}

/// Everything a single invocation ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub suites: Vec<SuiteReport>,
}

impl RunReport {
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.suites.iter().map(|s| s.outcomes.len()).sum()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.suites.iter().map(SuiteReport::failed).sum()
    }

    /// Process exit code: 0 when every scenario passed, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.failed() > 0)
    }

    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for suite in &self.suites {
            let _ = writeln!(
                out,
                "{} - {} (driver: {})",
                suite.suite_id, suite.suite_name, suite.driver
            );

            for outcome in &suite.outcomes {
                let _ = writeln!(
                    out,
                    "  {} {}  {} ({} ms)",
                    outcome.status.label(),
                    outcome.scenario_id,
                    outcome.name,
                    outcome.duration_ms
                );

                match &outcome.status {
                    ScenarioStatus::Passed => {}
                    ScenarioStatus::Failed {
                        step_index,
                        step,
                        message,
                        ..
                    } => {
                        let _ = writeln!(out, "       step {step_index}: {step}");
                        let _ = writeln!(out, "       {message}");
                    }
                    ScenarioStatus::TimedOut { after_ms } => {
                        let _ = writeln!(out, "       exceeded scenario timeout after {after_ms} ms");
                    }
                    ScenarioStatus::Errored { message } => {
                        let _ = writeln!(out, "       {message}");
                    }
                }
            }
            out.push('\n');
        }

        let total = self.scenario_count();
        let failed = self.failed();
        let _ = writeln!(
            out,
            "{total} scenarios: {} passed, {failed} failed",
            total - failed
        );
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "wrote JSON report");
        Ok(())
    }
}
