//! Webcheck Core - Foundation crate for the webcheck scenario runner.
//!
//! This crate provides shared identifiers, error handling and configuration
//! management that the browser, scenario and runner crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Validated identifiers (`SuiteId`, `ScenarioId`)
//!
//! # Example
//!
//! ```rust
//! use webcheck_core::{AppConfig, ScenarioId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert!(config.browser.headless);
//!
//! let id = ScenarioId::new("homepage-loads")?;
//! println!("running {id} with {} workers", config.runner.workers);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, RunnerConfig, SuiteConfig};
pub use error::{ConfigError, ConfigResult, Result, WebcheckError};
pub use types::{ScenarioId, SuiteId};
