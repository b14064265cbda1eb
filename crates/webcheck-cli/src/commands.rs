//! Subcommand implementations.

use crate::{ConfigCommand, OutputFormat, RecordArgs, RunArgs, EXIT_CONFIG_ERROR};
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use url::Url;
use webcheck_core::{AppConfig, ScenarioId, SuiteId};
use webcheck_runner::recorder::suite_id_for;
use webcheck_runner::{
    DriverFactory, Recorder, Recording, RunReport, ScenarioFilter, SuiteRunner,
};
use webcheck_scenario::{Suite, SuiteLoader, SuiteRegistry};

/// Resolve the scenarios directory: flag, then config file, then workspace default.
fn loader(flag: Option<PathBuf>, config: &AppConfig) -> Result<SuiteLoader> {
    let loader = match flag.or_else(|| config.suite.scenarios_dir.clone()) {
        Some(dir) => SuiteLoader::new(dir)?,
        None => SuiteLoader::with_default_dir()?,
    };
    Ok(loader)
}

/// Registry holding either one named suite or every suite of the loader.
fn registry(loader: &SuiteLoader, suite: Option<&str>) -> Result<SuiteRegistry> {
    match suite {
        Some(id) => {
            let registry = SuiteRegistry::new();
            registry.insert(loader.load(&SuiteId::new(id)?)?)?;
            Ok(registry)
        }
        None => Ok(SuiteRegistry::load_from(loader)?),
    }
}

pub async fn run(scenarios_dir: Option<PathBuf>, args: RunArgs) -> Result<ExitCode> {
    let mut config = AppConfig::load_with_env().context("failed to load configuration")?;

    if let Some(workers) = args.workers {
        config.runner.workers = workers;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(dir) = args.offline {
        config.suite.offline_dir = Some(dir);
    }
    if let Some(dir) = args.artifacts {
        config.runner.artifacts_dir = Some(dir);
    }
    config.validate().context("invalid run options")?;
    config.runner.artifacts_dir = config.artifacts_dir();

    let registry = registry(&loader(scenarios_dir, &config)?, args.suite.as_deref())?;
    check_scenario_ids(&registry, &args.scenario_ids)?;

    let mut suites = registry.get_all();
    if let Some(base_url) = &config.suite.base_url {
        suites = suites
            .into_iter()
            .map(|suite| suite.with_base_url(base_url.as_str()))
            .collect();
    }

    let mut filter = ScenarioFilter::ids(args.scenario_ids);
    if let Some(pattern) = args.grep {
        filter = filter.with_grep(pattern);
    }
    if selected_scenarios(&suites, &filter) == 0 {
        bail!("no scenarios matched the selection");
    }

    let factory = DriverFactory::from_config(&config).await?;
    let mut report = RunReport::default();

    for suite in &suites {
        let runner = SuiteRunner::new(factory.for_suite(suite)?, &config.runner);
        report.suites.push(runner.run_suite(suite, &filter).await);
    }

    if let Err(e) = factory.shutdown().await {
        tracing::warn!(error = %e, "browser shutdown failed");
    }

    match args.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    if let Some(path) = &args.report {
        report.write_json(path)?;
    }

    Ok(ExitCode::from(u8::try_from(report.exit_code()).unwrap_or(1)))
}

/// Every requested scenario id must exist in one of the selected suites.
fn check_scenario_ids(registry: &SuiteRegistry, requested: &[String]) -> Result<()> {
    let unknown: Vec<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|id| {
            ScenarioId::new(*id).map_or(true, |id| registry.find_scenario(&id).is_empty())
        })
        .collect();

    if !unknown.is_empty() {
        bail!("unknown scenario id(s): {}", unknown.join(", "));
    }
    Ok(())
}

/// How many scenarios the filter leaves across all suites.
fn selected_scenarios(suites: &[Suite], filter: &ScenarioFilter) -> usize {
    suites
        .iter()
        .flat_map(|suite| suite.scenarios.iter())
        .filter(|scenario| filter.matches(scenario))
        .count()
}

pub fn list(scenarios_dir: Option<PathBuf>, suite: Option<String>) -> Result<ExitCode> {
    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    let loader = loader(scenarios_dir, &config)?;
    let registry = SuiteRegistry::load_from(&loader)?;

    if registry.is_empty() {
        println!("no suites found in {}", loader.dir().display());
        return Ok(ExitCode::SUCCESS);
    }

    let suites = match suite {
        Some(id) => vec![registry.get(&SuiteId::new(id)?)?],
        None => registry.get_all(),
    };
    for suite in &suites {
        println!("{} - {} ({})", suite.id(), suite.name(), suite.suite.base_url);
        for scenario in &suite.scenarios {
            println!("  {:<28} {}", scenario.id.as_str(), scenario.name);
        }
    }
    println!(
        "\n{} suites, {} scenarios",
        registry.count(),
        registry.scenario_count()
    );

    Ok(ExitCode::SUCCESS)
}

pub fn validate(scenarios_dir: Option<PathBuf>, path: Option<PathBuf>) -> Result<ExitCode> {
    let target = match path {
        Some(path) => path,
        None => {
            let config = AppConfig::load_with_env().context("failed to load configuration")?;
            loader(scenarios_dir, &config)?.dir().to_path_buf()
        }
    };

    let problems = validate_path(&target)?;
    if problems.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        for problem in &problems {
            eprintln!("{problem}");
        }
        Ok(ExitCode::from(EXIT_CONFIG_ERROR))
    }
}

/// Validate a suite file or every suite below a directory.
///
/// Prints one line per valid file and returns the problems found.
fn validate_path(target: &Path) -> Result<Vec<String>> {
    if target.is_file() {
        return Ok(match SuiteLoader::load_file(target) {
            Ok(suite) => {
                println!("ok   {} ({} scenarios)", target.display(), suite.scenarios.len());
                Vec::new()
            }
            Err(e) => vec![format!("FAIL {}: {e}", target.display())],
        });
    }

    let mut problems = Vec::new();
    let mut seen: HashSet<SuiteId> = HashSet::new();

    for (path, outcome) in SuiteLoader::new(target)?.check_all()? {
        match outcome {
            Ok(suite) => {
                if seen.insert(suite.id().clone()) {
                    println!("ok   {} ({} scenarios)", path.display(), suite.scenarios.len());
                } else {
                    problems.push(format!(
                        "FAIL {}: suite id '{}' declared by more than one file",
                        path.display(),
                        suite.id()
                    ));
                }
            }
            Err(e) => problems.push(format!("FAIL {}: {e}", path.display())),
        }
    }

    Ok(problems)
}

pub async fn record(args: RecordArgs) -> Result<ExitCode> {
    let mut config = AppConfig::load_with_env().context("failed to load configuration")?;
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(dir) = args.offline {
        config.suite.offline_dir = Some(dir);
    }
    config.validate().context("invalid record options")?;

    let start = Url::parse(&args.url).with_context(|| format!("invalid URL '{}'", args.url))?;
    if !start.has_host() {
        bail!("URL '{}' has no host", args.url);
    }
    let suite_id = match args.suite_id {
        Some(id) => Some(SuiteId::new(id)?),
        None => None,
    };

    let factory = DriverFactory::from_config(&config).await?;
    let recorded = record_site(&factory, &Recorder::new(args.max_pages), &start, &args.out).await;
    if let Err(e) = factory.shutdown().await {
        tracing::warn!(error = %e, "browser shutdown failed");
    }
    let recording = recorded?;

    for page in &recording.pages {
        println!("saved   {} -> {}", page.url, page.file.display());
    }
    for skipped in &recording.skipped {
        println!("skipped {}: {}", skipped.url, skipped.error);
    }
    println!(
        "\n{} pages recorded into {}",
        recording.pages.len(),
        args.out.display()
    );

    if let Some(path) = &args.suite_out {
        let id = match suite_id.or_else(|| suite_id_for(&start)) {
            Some(id) => id,
            None => SuiteId::new("recorded-site")?,
        };
        let count = write_skeleton(&recording, id, path)?;
        println!("suite skeleton with {count} scenarios written to {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

async fn record_site(
    factory: &DriverFactory,
    recorder: &Recorder,
    start: &Url,
    out: &Path,
) -> webcheck_runner::Result<Recording> {
    let driver = factory.for_site(start.as_str())?;
    recorder.record(driver.as_ref(), start, out).await
}

/// Write the recording's suite skeleton, returning its scenario count.
fn write_skeleton(recording: &Recording, id: SuiteId, path: &Path) -> Result<usize> {
    let suite = recording.to_suite(id);
    suite.validate()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, suite.to_toml_string()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(suite.scenarios.len())
}

pub fn config(command: ConfigCommand) -> Result<ExitCode> {
    match command {
        ConfigCommand::Show => {
            let config = AppConfig::load_with_env().context("failed to load configuration")?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigCommand::Path => println!("{}", AppConfig::config_path()?.display()),
        ConfigCommand::Init { force } => {
            let path = AppConfig::config_path()?;
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            AppConfig::default().save()?;
            println!("wrote {}", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}
