//! Configuration management for webcheck.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/webcheck/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Scenario execution settings
    pub runner: RunnerConfig,
    /// Scenario source settings
    pub suite: SuiteConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file is missing.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `WEBCHECK_HEADLESS`: Override browser headless mode (true/false)
    /// - `WEBCHECK_WORKERS`: Override number of parallel scenario workers
    /// - `WEBCHECK_BASE_URL`: Override the base URL of every suite
    /// - `WEBCHECK_OFFLINE_DIR`: Run against recorded HTML snapshots in this directory
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("WEBCHECK_HEADLESS") {
            match val.parse() {
                Ok(headless) => {
                    self.browser.headless = headless;
                    tracing::debug!("Override browser.headless from env: {}", headless);
                }
                Err(_) => tracing::warn!("Ignoring invalid WEBCHECK_HEADLESS value '{}'", val),
            }
        }

        if let Some(val) = lookup("WEBCHECK_WORKERS") {
            match val.parse() {
                Ok(workers) => {
                    self.runner.workers = workers;
                    tracing::debug!("Override runner.workers from env: {}", workers);
                }
                Err(_) => tracing::warn!("Ignoring invalid WEBCHECK_WORKERS value '{}'", val),
            }
        }

        if let Some(val) = lookup("WEBCHECK_BASE_URL") {
            if !val.is_empty() {
                tracing::debug!("Override suite.base_url from env: {}", val);
                self.suite.base_url = Some(val);
            }
        }

        if let Some(val) = lookup("WEBCHECK_OFFLINE_DIR") {
            if !val.is_empty() {
                tracing::debug!("Override suite.offline_dir from env: {}", val);
                self.suite.offline_dir = Some(PathBuf::from(val));
            }
        }
    }

    /// Check values that would make a run impossible.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.runner.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "runner.workers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.runner.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "runner.poll_interval_ms".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        for (field, value) in [
            ("runner.scenario_timeout_secs", self.runner.scenario_timeout_secs),
            ("runner.action_timeout_ms", self.runner.action_timeout_ms),
            ("runner.assertion_timeout_ms", self.runner.assertion_timeout_ms),
            ("browser.navigation_timeout_secs", self.browser.navigation_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }

        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.window_width/window_height".to_string(),
                reason: "window dimensions must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        fs::write(config_path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Render the configuration as it would be saved.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Where failure screenshots go: `runner.artifacts_dir` when set,
    /// otherwise `artifacts/` under the data directory.
    #[must_use]
    pub fn artifacts_dir(&self) -> Option<PathBuf> {
        self.runner
            .artifacts_dir
            .clone()
            .or_else(|| Self::data_dir().ok().map(|dir| dir.join("artifacts")))
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/webcheck/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "webcheck", "webcheck").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path, which holds the default artifacts directory.
    ///
    /// Uses XDG base directories: `~/.local/share/webcheck`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "webcheck", "webcheck").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Disable the Chromium sandbox (needed in most containers)
    pub no_sandbox: bool,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Explicit Chrome/Chromium executable; auto-detected when unset
    pub executable: Option<PathBuf>,
}

impl BrowserConfig {
    /// Navigation timeout as a [`Duration`].
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 720,
            no_sandbox: true,
            navigation_timeout_secs: 30,
            executable: None,
        }
    }
}

/// Scenario execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum number of scenarios running at the same time
    pub workers: usize,
    /// Global per-scenario timeout in seconds
    pub scenario_timeout_secs: u64,
    /// How long a click waits for its target to appear, in milliseconds
    pub action_timeout_ms: u64,
    /// How long an assertion keeps polling before failing, in milliseconds
    pub assertion_timeout_ms: u64,
    /// Delay between polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Directory for failure screenshots; see [`AppConfig::artifacts_dir`] for the default
    pub artifacts_dir: Option<PathBuf>,
}

impl RunnerConfig {
    /// Global per-scenario timeout.
    #[must_use]
    pub fn scenario_timeout(&self) -> Duration {
        Duration::from_secs(self.scenario_timeout_secs)
    }

    /// Click wait timeout.
    #[must_use]
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Assertion polling timeout.
    #[must_use]
    pub fn assertion_timeout(&self) -> Duration {
        Duration::from_millis(self.assertion_timeout_ms)
    }

    /// Delay between polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            scenario_timeout_secs: 60,
            action_timeout_ms: 5_000,
            assertion_timeout_ms: 5_000,
            poll_interval_ms: 100,
            artifacts_dir: None,
        }
    }
}

/// Where scenarios come from and which site they run against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Directory of suite TOML files; `scenarios/` at the workspace root when unset
    pub scenarios_dir: Option<PathBuf>,
    /// Replaces the `base_url` of every loaded suite
    pub base_url: Option<String>,
    /// Run against recorded HTML pages in this directory instead of Chromium
    pub offline_dir: Option<PathBuf>,
}
