//! Suite loading from TOML files.
//!
//! This module handles loading suites from the `scenarios/` directory.
//! Every `*.toml` file below the directory holds exactly one suite.

use crate::{
    definition::Suite,
    error::{Result, ScenarioError},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use webcheck_core::SuiteId;

/// Loader for suites stored as TOML files.
pub struct SuiteLoader {
    /// Base directory containing suite files
    scenarios_dir: PathBuf,
}

impl SuiteLoader {
    /// Create a new loader with the given scenarios directory.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(scenarios_dir: impl Into<PathBuf>) -> Result<Self> {
        let scenarios_dir = scenarios_dir.into();

        if !scenarios_dir.is_dir() {
            return Err(ScenarioError::DirectoryNotFound {
                path: scenarios_dir.display().to_string(),
            });
        }

        Ok(Self { scenarios_dir })
    }

    /// Create a loader using the default scenarios directory.
    ///
    /// Looks for `scenarios/` relative to the workspace root.
    ///
    /// # Errors
    /// Returns error if the default directory doesn't exist.
    pub fn with_default_dir() -> Result<Self> {
        // Find workspace root by looking for Cargo.toml with [workspace]
        let mut current_dir = std::env::current_dir()?;

        loop {
            let cargo_toml = current_dir.join("Cargo.toml");
            if cargo_toml.exists() {
                if let Ok(contents) = std::fs::read_to_string(&cargo_toml) {
                    if contents.contains("[workspace]") {
                        let scenarios_dir = current_dir.join("scenarios");
                        if scenarios_dir.exists() {
                            return Self::new(scenarios_dir);
                        }
                    }
                }
            }

            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }

        // Fallback: try relative path
        Self::new(PathBuf::from("scenarios"))
    }

    /// Directory this loader reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.scenarios_dir
    }

    /// Load a single suite by ID.
    ///
    /// The suite file is expected to be named `<id>.toml` somewhere below the
    /// scenarios directory.
    ///
    /// # Errors
    /// Returns error if the file doesn't exist, can't be read, or is invalid.
    pub fn load(&self, suite_id: &SuiteId) -> Result<Suite> {
        let filename = format!("{}.toml", suite_id.as_str());

        let Some(path) = Self::find_file(&self.scenarios_dir, &filename)? else {
            return Err(ScenarioError::NotFound {
                suite_id: suite_id.to_string(),
            });
        };

        let suite = Self::load_file(&path)?;
        if suite.id() != suite_id {
            return Err(ScenarioError::ValidationError {
                suite_id: suite_id.to_string(),
                reason: format!("{} declares suite id '{}'", path.display(), suite.id()),
            });
        }
        Ok(suite)
    }

    /// Load every suite below the scenarios directory.
    ///
    /// Unlike [`check_all`](Self::check_all) this stops at the first file
    /// that fails to load, so a broken definition can never drop scenarios
    /// from a run unnoticed.
    ///
    /// # Errors
    /// Returns error if the directory can't be read or any suite is invalid.
    pub fn load_all(&self) -> Result<Vec<Suite>> {
        let mut suites = Vec::new();
        for path in self.suite_files()? {
            suites.push(Self::load_file(&path)?);
        }

        let mut seen = std::collections::HashSet::new();
        for suite in &suites {
            if !seen.insert(suite.id()) {
                return Err(ScenarioError::ValidationError {
                    suite_id: suite.id().to_string(),
                    reason: "suite id declared by more than one file".to_string(),
                });
            }
        }

        info!(
            count = suites.len(),
            dir = %self.scenarios_dir.display(),
            "loaded suites"
        );

        Ok(suites)
    }

    /// Load and validate every suite file, reporting each outcome separately.
    ///
    /// # Errors
    /// Returns error only if the directory can't be read.
    pub fn check_all(&self) -> Result<Vec<(PathBuf, Result<Suite>)>> {
        Ok(self
            .suite_files()?
            .into_iter()
            .map(|path| {
                let outcome = Self::load_file(&path);
                (path, outcome)
            })
            .collect())
    }

    /// Load and validate a suite from a specific file path.
    pub fn load_file(path: &Path) -> Result<Suite> {
        let contents = std::fs::read_to_string(path).map_err(|e| ScenarioError::LoadError {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        let suite: Suite = toml::from_str(&contents).map_err(|e| ScenarioError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;

        suite.validate()?;

        debug!(
            suite_id = %suite.id(),
            scenarios = suite.scenarios.len(),
            path = %path.display(),
            "loaded suite"
        );

        Ok(suite)
    }

    /// All `*.toml` files below the directory, sorted for a stable order.
    fn suite_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        Self::collect_recursive(&self.scenarios_dir, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn collect_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                Self::collect_recursive(&path, files)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                files.push(path);
            }
        }

        Ok(())
    }

    /// Recursively search for a file by name.
    fn find_file(dir: &Path, filename: &str) -> Result<Option<PathBuf>> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                if let Some(found) = Self::find_file(&path, filename)? {
                    return Ok(Some(found));
                }
            } else if path.file_name().and_then(|s| s.to_str()) == Some(filename) {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_suite_file(dir: &Path, subdir: &str, suite_id: &str) -> PathBuf {
        let suite_dir = dir.join(subdir);
        std::fs::create_dir_all(&suite_dir).expect("create suite dir");

        let file_path = suite_dir.join(format!("{suite_id}.toml"));

        let content = format!(
            r#"
[suite]
id = "{suite_id}"
name = "Test Suite"
base_url = "https://demo.test"

[[scenario]]
id = "loads"
name = "page loads"

[[scenario.steps]]
action = "navigate"
url = "/"

[[scenario.steps]]
action = "assert"
locator = "h1"
expect = {{ condition = "visible" }}
"#
        );

        std::fs::write(&file_path, content).expect("write test file");
        file_path
    }

    #[test]
    fn test_loader_new_with_existing_dir() {
        let temp_dir = TempDir::new().expect("create temp dir");
        assert!(SuiteLoader::new(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_loader_new_with_nonexistent_dir() {
        let loader = SuiteLoader::new("/nonexistent/path/to/scenarios");
        assert!(matches!(
            loader,
            Err(ScenarioError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_load_single_suite() {
        let temp_dir = TempDir::new().expect("create temp dir");
        create_suite_file(temp_dir.path(), "demo", "demo-suite");

        let loader = SuiteLoader::new(temp_dir.path()).expect("create loader");
        let suite_id = SuiteId::new("demo-suite").expect("valid suite ID");
        let suite = loader.load(&suite_id).expect("load suite");

        assert_eq!(suite.id(), &suite_id);
        assert_eq!(suite.name(), "Test Suite");
        assert_eq!(suite.scenarios.len(), 1);
    }

    #[test]
    fn test_load_nonexistent_suite() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let loader = SuiteLoader::new(temp_dir.path()).expect("create loader");
        let suite_id = SuiteId::new("nonexistent").expect("valid suite ID");

        let result = loader.load(&suite_id);
        assert!(matches!(result, Err(ScenarioError::NotFound { .. })));
    }

    #[test]
    fn test_load_all_suites() {
        let temp_dir = TempDir::new().expect("create temp dir");
        create_suite_file(temp_dir.path(), "a", "suite-one");
        create_suite_file(temp_dir.path(), "a", "suite-two");
        create_suite_file(temp_dir.path(), "b", "suite-three");

        let loader = SuiteLoader::new(temp_dir.path()).expect("create loader");
        let suites = loader.load_all().expect("load all suites");

        assert_eq!(suites.len(), 3);
        let ids: std::collections::HashSet<_> = suites.iter().map(Suite::id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_load_all_fails_on_invalid_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        create_suite_file(temp_dir.path(), "a", "valid-suite");
        std::fs::write(temp_dir.path().join("broken.toml"), "invalid toml content [[[")
            .expect("write invalid file");

        let loader = SuiteLoader::new(temp_dir.path()).expect("create loader");
        let result = loader.load_all();
        assert!(matches!(result, Err(ScenarioError::ParseError { .. })));
    }

    #[test]
    fn test_load_all_rejects_duplicate_suite_ids() {
        let temp_dir = TempDir::new().expect("create temp dir");
        create_suite_file(temp_dir.path(), "a", "same-suite");
        create_suite_file(temp_dir.path(), "b", "same-suite");

        let loader = SuiteLoader::new(temp_dir.path()).expect("create loader");
        assert!(matches!(
            loader.load_all(),
            Err(ScenarioError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_check_all_reports_each_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        create_suite_file(temp_dir.path(), "a", "valid-suite");
        std::fs::write(temp_dir.path().join("broken.toml"), "[suite]\nid = \"Bad Id\"\n")
            .expect("write invalid file");

        let loader = SuiteLoader::new(temp_dir.path()).expect("create loader");
        let results = loader.check_all().expect("check all");

        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|(_, r)| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|(_, r)| r.is_err()).count(), 1);
    }
}
