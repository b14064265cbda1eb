//! In-memory suite registry.

use crate::{
    definition::{Scenario, Suite},
    error::{Result, ScenarioError},
    loader::SuiteLoader,
};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use webcheck_core::{ScenarioId, SuiteId};

/// In-memory cache of suites.
///
/// Suites are static for the lifetime of a run: they are loaded once at
/// start-up and handed to the runner by reference.
#[derive(Clone, Default)]
pub struct SuiteRegistry {
    /// Cached suites, indexed and ordered by suite ID
    suites: Arc<RwLock<BTreeMap<SuiteId, Suite>>>,
}

impl SuiteRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry and load all suites from the given loader.
    ///
    /// # Errors
    /// Returns error if loading fails.
    pub fn load_from(loader: &SuiteLoader) -> Result<Self> {
        let registry = Self::new();
        registry.reload(loader)?;
        Ok(registry)
    }

    /// Reload all suites from the loader, replacing the current cache.
    ///
    /// # Errors
    /// Returns error if loading fails; the cache is left untouched then.
    pub fn reload(&self, loader: &SuiteLoader) -> Result<()> {
        let suites = loader.load_all()?;

        let mut cache = self.suites.write().expect("acquire write lock on suites");
        cache.clear();
        for suite in suites {
            cache.insert(suite.id().clone(), suite);
        }

        info!(count = cache.len(), "suite registry reloaded");
        Ok(())
    }

    /// Add or replace a single suite after validating it.
    pub fn insert(&self, suite: Suite) -> Result<()> {
        suite.validate()?;
        debug!(suite_id = %suite.id(), "registering suite");
        self.suites
            .write()
            .expect("acquire write lock on suites")
            .insert(suite.id().clone(), suite);
        Ok(())
    }

    /// Get a suite by ID.
    ///
    /// # Errors
    /// Returns [`ScenarioError::NotFound`] for unknown IDs.
    pub fn get(&self, suite_id: &SuiteId) -> Result<Suite> {
        self.suites
            .read()
            .expect("acquire read lock on suites")
            .get(suite_id)
            .cloned()
            .ok_or_else(|| ScenarioError::NotFound {
                suite_id: suite_id.to_string(),
            })
    }

    /// All suites ordered by ID.
    #[must_use]
    pub fn get_all(&self) -> Vec<Suite> {
        self.suites
            .read()
            .expect("acquire read lock on suites")
            .values()
            .cloned()
            .collect()
    }

    /// Find which suite declares a scenario ID.
    #[must_use]
    pub fn find_scenario(&self, scenario_id: &ScenarioId) -> Vec<(SuiteId, Scenario)> {
        self.suites
            .read()
            .expect("acquire read lock on suites")
            .values()
            .filter_map(|suite| {
                suite
                    .scenario(scenario_id)
                    .map(|scenario| (suite.id().clone(), scenario.clone()))
            })
            .collect()
    }

    /// Number of suites.
    #[must_use]
    pub fn count(&self) -> usize {
        self.suites.read().expect("acquire read lock on suites").len()
    }

    /// Whether the registry holds no suites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Total scenarios across all suites.
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.suites
            .read()
            .expect("acquire read lock on suites")
            .values()
            .map(|suite| suite.scenarios.len())
            .sum()
    }
}
