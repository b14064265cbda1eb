//! Checks on the suite definitions shipped in `scenarios/`.

use std::path::Path;
use webcheck_core::{ScenarioId, SuiteId};
use webcheck_scenario::{Condition, Step, SuiteLoader, SuiteRegistry};

fn loader() -> SuiteLoader {
    SuiteLoader::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios"))
        .expect("scenarios directory exists")
}

#[test]
fn test_all_shipped_suites_load() {
    let suites = loader().load_all().expect("every suite is valid");
    assert!(!suites.is_empty());
}

#[test]
fn test_homepage_suite_shape() {
    let registry = SuiteRegistry::load_from(&loader()).expect("load registry");
    let suite = registry
        .get(&SuiteId::new("homepage").unwrap())
        .expect("homepage suite");

    assert_eq!(suite.suite.base_url, "https://the-internet.herokuapp.com");
    assert!(matches!(suite.setup.as_slice(), [Step::Navigate { url }] if url == "/"));
    assert_eq!(suite.scenarios.len(), 7);

    let footer = suite
        .scenario(&ScenarioId::new("footer-link").unwrap())
        .expect("footer scenario");
    assert!(footer.steps.iter().any(|step| matches!(
        step,
        Step::Assert { expect: Condition::CountEquals { count: 1 }, .. }
    )));
}

#[test]
fn test_navigation_scenarios_check_destination_url() {
    let registry = SuiteRegistry::load_from(&loader()).expect("load registry");

    for (id, path) in [
        ("opens-ab-testing", "/abtest"),
        ("opens-add-remove-elements", "/add_remove_elements"),
        ("opens-form-authentication", "/login"),
    ] {
        let found = registry.find_scenario(&ScenarioId::new(id).unwrap());
        assert_eq!(found.len(), 1, "{id} defined once");

        let (_, scenario) = &found[0];
        assert!(matches!(scenario.steps.first(), Some(Step::Click { .. })));
        assert!(
            scenario.steps.iter().any(|step| matches!(
                step,
                Step::Assert { locator: None, expect: Condition::UrlMatches { pattern }, .. }
                    if pattern.contains(path)
            )),
            "{id} checks the URL"
        );
    }
}
