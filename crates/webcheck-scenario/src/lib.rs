//! Webcheck Scenario - declarative end-to-end scenario definitions.
//!
//! Suites are TOML files describing scenarios as ordered steps: navigate,
//! click, and assert a condition on the page or on located elements. This
//! crate parses, validates and caches them; executing them is the runner's
//! job.
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): `Suite`, `Scenario`, `Step`, `Condition`
//! - **Loader** ([`loader`]): TOML file loading from the `scenarios/` directory
//! - **Registry** ([`registry`]): In-memory cache with lookup by suite and scenario
//! - **Errors** ([`error`]): Scenario-specific error types
//!
//! # Example
//!
//! ```rust,no_run
//! use webcheck_core::SuiteId;
//! use webcheck_scenario::{SuiteLoader, SuiteRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = SuiteLoader::with_default_dir()?;
//! let registry = SuiteRegistry::load_from(&loader)?;
//!
//! let suite = registry.get(&SuiteId::new("homepage")?)?;
//! for scenario in &suite.scenarios {
//!     println!("{}: {}", scenario.id, scenario.name);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod definition;
pub mod error;
pub mod loader;
pub mod registry;

// Re-export commonly used types
pub use definition::{Condition, Scenario, Step, Suite, SuiteMetadata};
pub use error::{Result, ScenarioError};
pub use loader::SuiteLoader;
pub use registry::SuiteRegistry;
