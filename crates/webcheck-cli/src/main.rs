//! `webcheck` - run declarative end-to-end browser scenarios.

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use webcheck_runner::recorder::DEFAULT_MAX_PAGES;

/// Exit code for configuration and definition errors.
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "webcheck", version, about = "Run end-to-end browser scenarios")]
struct Cli {
    /// Directory holding suite definitions (default: `scenarios/` at the workspace root)
    #[arg(long, global = true, value_name = "DIR")]
    scenarios: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute scenarios and report the outcome
    Run(RunArgs),
    /// Print every suite and its scenarios
    List {
        /// Only print this suite
        #[arg(long, value_name = "ID")]
        suite: Option<String>,
    },
    /// Load and validate suite definitions without running them
    Validate {
        /// Suite file or directory (default: the scenarios directory)
        path: Option<PathBuf>,
    },
    /// Save a site's pages for offline runs and sketch a suite for them
    Record(RecordArgs),
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration, environment overrides included
    Show,
    /// Print where the configuration file lives
    Path,
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
struct RecordArgs {
    /// Start page; links to the same host are followed from it
    url: String,

    /// Maximum links followed from the start page
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: usize,

    /// Directory the pages are saved to, in the `--offline` layout
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    /// Also write a suite with one scenario per saved page to PATH
    #[arg(long, value_name = "PATH")]
    suite_out: Option<PathBuf>,

    /// Id of the generated suite (default: derived from the host)
    #[arg(long, value_name = "ID", requires = "suite_out")]
    suite_id: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Read pages from an earlier recording in DIR instead of a browser
    #[arg(long, value_name = "DIR")]
    offline: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Only run this suite
    #[arg(long, value_name = "ID")]
    suite: Option<String>,

    /// Only run these scenarios (repeatable)
    #[arg(long = "scenario", value_name = "ID")]
    scenario_ids: Vec<String>,

    /// Only run scenarios whose name or id contains TEXT
    #[arg(long, value_name = "TEXT")]
    grep: Option<String>,

    /// Maximum scenarios running at once
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Serve recorded pages from DIR instead of launching a browser
    #[arg(long, value_name = "DIR")]
    offline: Option<PathBuf>,

    /// Output format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also write the JSON report to PATH
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Save screenshots of failed scenarios below DIR
    #[arg(long, value_name = "DIR")]
    artifacts: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,webcheck=debug"));

    // Logs go to stderr so stdout carries only the report.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting webcheck v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Command::Run(args) => commands::run(cli.scenarios, args).await,
        Command::List { suite } => commands::list(cli.scenarios, suite),
        Command::Validate { path } => commands::validate(cli.scenarios, path),
        Command::Record(args) => commands::record(args).await,
        Command::Config { command } => commands::config(command),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "webcheck failed");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}
