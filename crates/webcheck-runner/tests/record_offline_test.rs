//! Recording pages and replaying the generated suite against them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;
use webcheck_browser::SnapshotDriver;
use webcheck_core::{RunnerConfig, SuiteId};
use webcheck_runner::{Recorder, ScenarioFilter, SuiteRunner};
use webcheck_scenario::{Suite, SuiteLoader};

const SITE: &str = "https://the-internet.herokuapp.com/";

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/the-internet")
}

#[tokio::test]
async fn test_generated_suite_passes_against_recording() {
    let out = tempfile::TempDir::new().unwrap();
    let start = Url::parse(SITE).unwrap();
    let source = SnapshotDriver::new(fixtures(), SITE).unwrap();

    let recording = Recorder::new(3)
        .record(&source, &start, out.path())
        .await
        .expect("record site");
    assert_eq!(recording.pages.len(), 3);
    assert_eq!(recording.skipped.len(), 1);

    // Written and read back the way `webcheck record --suite-out` does it.
    let suite = recording.to_suite(SuiteId::new("recorded").unwrap());
    let suite_file = out.path().join("recorded.toml");
    std::fs::write(&suite_file, suite.to_toml_string().unwrap()).unwrap();
    let suite: Suite = SuiteLoader::load_file(&suite_file).expect("skeleton loads");

    let ids: Vec<_> = suite.scenarios.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["page-home", "page-abtest", "page-add-remove-elements"]);

    let replay = SnapshotDriver::new(out.path(), &suite.suite.base_url).unwrap();
    let config = RunnerConfig {
        assertion_timeout_ms: 200,
        action_timeout_ms: 200,
        poll_interval_ms: 20,
        ..RunnerConfig::default()
    };
    let report = SuiteRunner::new(Arc::new(replay), &config)
        .run_suite(&suite, &ScenarioFilter::all())
        .await;

    assert!(report.all_passed(), "{:?}", report.outcomes);
    assert_eq!(report.passed(), 3);
}

#[tokio::test]
async fn test_recording_replays_the_homepage_suite() {
    let out = tempfile::TempDir::new().unwrap();
    let start = Url::parse(SITE).unwrap();
    let source = SnapshotDriver::new(fixtures(), SITE).unwrap();

    Recorder::new(2)
        .record(&source, &start, out.path())
        .await
        .expect("record site");
    // The homepage suite also visits the login page.
    Recorder::new(0)
        .record(&source, &start.join("/login").unwrap(), out.path())
        .await
        .expect("record login page");

    let suite = SuiteLoader::load_file(
        &Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios/the-internet/homepage.toml"),
    )
    .expect("homepage suite");
    let driver = SnapshotDriver::new(out.path(), &suite.suite.base_url).unwrap();
    let config = RunnerConfig {
        assertion_timeout_ms: 200,
        action_timeout_ms: 200,
        poll_interval_ms: 20,
        ..RunnerConfig::default()
    };

    let report = SuiteRunner::new(Arc::new(driver), &config)
        .run_suite(&suite, &ScenarioFilter::all())
        .await;
    assert!(report.all_passed(), "{:?}", report.outcomes);
}
