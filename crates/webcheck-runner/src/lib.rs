//! Webcheck Runner - scenario execution and reporting.
//!
//! This crate runs the scenarios of a suite against a browser driver. Each
//! scenario gets its own fresh context so cookies and history never leak
//! between scenarios, and several scenarios run at once up to a worker limit.
//!
//! # Features
//!
//! - Sequential step execution with implicit waits for clicks and assertions
//! - Fail-fast scenarios: the first failing step ends the scenario
//! - Global per-scenario timeout
//! - Best-effort screenshots of failed scenarios
//! - Text and JSON reports with a process exit code
//! - Recording a site's pages for offline runs, with a suite skeleton
//!
//! # Example
//!
//! ```rust,ignore
//! use webcheck_runner::{DriverFactory, ScenarioFilter, SuiteRunner};
//!
//! let factory = DriverFactory::from_config(&config).await?;
//! let runner = SuiteRunner::new(factory.for_suite(&suite)?, &config.runner);
//!
//! let report = runner.run_suite(&suite, &ScenarioFilter::all()).await;
//! println!("{} passed, {} failed", report.passed(), report.failed());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod driver;
#[allow(missing_docs)]
pub mod error;
pub mod executor;
#[allow(missing_docs)]
pub mod expectation;
#[allow(missing_docs)]
pub mod filter;
pub mod orchestrator;
#[allow(missing_docs)]
pub mod recorder;
#[allow(missing_docs)]
pub mod report;

// Re-export commonly used types
pub use driver::DriverFactory;
pub use error::{FailureKind, Result, RunnerError, StepError};
pub use executor::{ScenarioExecutor, StepFailure};
pub use filter::ScenarioFilter;
pub use orchestrator::SuiteRunner;
pub use recorder::{Recorder, Recording};
pub use report::{RunReport, ScenarioOutcome, ScenarioStatus, SuiteReport};
