#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use webcheck_scenario::Scenario;

/// Selects which scenarios of a suite run.
///
/// An empty filter selects everything. IDs and the name pattern combine with
/// AND: a scenario must be listed (when IDs are given) and match the pattern
/// (when one is given).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioFilter {
    pub ids: Vec<String>,
    pub grep: Option<String>,
}

impl ScenarioFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn ids(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            grep: None,
        }
    }

    pub fn with_grep(mut self, pattern: impl Into<String>) -> Self {
        self.grep = Some(pattern.into());
        self
    }

    pub fn matches(&self, scenario: &Scenario) -> bool {
        let id_ok = self.ids.is_empty() || self.ids.iter().any(|id| scenario.id.as_str() == id);

        let grep_ok = self.grep.as_ref().map_or(true, |pattern| {
            let pattern = pattern.to_lowercase();
            scenario.name.to_lowercase().contains(&pattern)
                || scenario.id.as_str().contains(&pattern)
        });

        id_ok && grep_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcheck_core::ScenarioId;

    fn scenario(id: &str, name: &str) -> Scenario {
        Scenario {
            id: ScenarioId::new(id).unwrap(),
            name: name.to_string(),
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_all_matches_everything() {
        assert!(ScenarioFilter::all().matches(&scenario("footer-link", "footer")));
    }

    #[test]
    fn test_ids() {
        let filter = ScenarioFilter::ids(["footer-link", "loads-homepage"]);
        assert!(filter.matches(&scenario("footer-link", "footer")));
        assert!(!filter.matches(&scenario("opens-ab-testing", "A/B")));
    }

    #[test]
    fn test_grep_is_case_insensitive() {
        let filter = ScenarioFilter::all().with_grep("NAVIGATE");
        assert!(filter.matches(&scenario("opens-ab-testing", "should navigate to A/B Testing page")));
        assert!(!filter.matches(&scenario("footer-link", "should have footer")));
    }

    #[test]
    fn test_ids_and_grep_combine() {
        let filter = ScenarioFilter::ids(["opens-ab-testing", "footer-link"]).with_grep("footer");
        assert!(filter.matches(&scenario("footer-link", "should have footer")));
        assert!(!filter.matches(&scenario("opens-ab-testing", "should navigate")));
    }
}
