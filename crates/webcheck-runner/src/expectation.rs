//! Evaluation of expected conditions against observed page state.
//!
//! Everything here is synchronous and side-effect free; the executor
//! gathers observations from the browser and polls these checks.

use regex::Regex;
use webcheck_browser::{normalize_text, ElementState};
use webcheck_scenario::Condition;

/// Result of checking a condition once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub holds: bool,
    /// What was observed, for failure messages
    pub actual: String,
}

impl Evaluation {
    fn new(holds: bool, actual: impl Into<String>) -> Self {
        Self {
            holds,
            actual: actual.into(),
        }
    }
}

/// A condition prepared for repeated checks while polling.
///
/// URL and title patterns are compiled once, when the step starts.
#[derive(Debug, Clone)]
pub struct Expectation<'a> {
    condition: &'a Condition,
    pattern: Option<Regex>,
}

impl<'a> Expectation<'a> {
    /// Compile the condition's pattern, if it has one.
    pub fn compile(condition: &'a Condition) -> Result<Self, regex::Error> {
        Ok(Self {
            condition,
            pattern: condition.regex().transpose()?,
        })
    }

    #[must_use]
    pub fn condition(&self) -> &'a Condition {
        self.condition
    }

    /// Check a page-level condition against the current URL and title.
    ///
    /// Only the value the condition needs is read.
    pub fn check_page(&self, url: &str, title: &str) -> Evaluation {
        let (subject, value) = match self.condition {
            Condition::UrlMatches { .. } => ("url", url),
            Condition::TitleMatches { .. } => ("title", title),
            other => {
                return Evaluation::new(
                    false,
                    format!("{} is not a page-level condition", other.kind()),
                )
            }
        };

        match &self.pattern {
            Some(regex) => Evaluation::new(regex.is_match(value), format!("{subject} {value:?}")),
            None => Evaluation::new(false, "no pattern"),
        }
    }

    /// Check an element condition against every element the locator matched.
    ///
    /// Count conditions look at the whole set; the rest look at element `nth`
    /// (the first when `None`).
    pub fn check_elements(&self, elements: &[ElementState], nth: Option<usize>) -> Evaluation {
        match self.condition {
            Condition::CountGreaterThan { count } => {
                return Evaluation::new(
                    elements.len() > *count,
                    format!("{} matching elements", elements.len()),
                )
            }
            Condition::CountEquals { count } => {
                return Evaluation::new(
                    elements.len() == *count,
                    format!("{} matching elements", elements.len()),
                )
            }
            _ => {}
        }

        let index = nth.unwrap_or(0);
        let Some(element) = elements.get(index) else {
            return Evaluation::new(
                false,
                format!("no element at index {index} ({} matched)", elements.len()),
            );
        };

        match self.condition {
            Condition::Visible => Evaluation::new(
                element.visible,
                if element.visible { "visible" } else { "hidden" },
            ),
            Condition::TextEquals { value } => Evaluation::new(
                element.text == normalize_text(value),
                format!("text {:?}", element.text),
            ),
            Condition::TextContains { value } => Evaluation::new(
                element.text.contains(&normalize_text(value)),
                format!("text {:?}", element.text),
            ),
            Condition::AttributeEquals { name, value } => {
                let actual = element.attribute(name);
                Evaluation::new(actual == Some(value.as_str()), describe_attribute(name, actual))
            }
            Condition::AttributePresent { name } => {
                let actual = element.attribute(name);
                Evaluation::new(
                    actual.is_some_and(|v| !v.is_empty()),
                    describe_attribute(name, actual),
                )
            }
            other => Evaluation::new(false, format!("{} is not an element condition", other.kind())),
        }
    }
}

fn describe_attribute(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{name}={value:?}"),
        None => format!("no {name} attribute"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_page(condition: &Condition, url: &str, title: &str) -> Evaluation {
        Expectation::compile(condition)
            .expect("pattern compiles")
            .check_page(url, title)
    }

    fn check_elements(
        condition: &Condition,
        elements: &[ElementState],
        nth: Option<usize>,
    ) -> Evaluation {
        Expectation::compile(condition)
            .expect("pattern compiles")
            .check_elements(elements, nth)
    }

    fn link(text: &str, href: Option<&str>, visible: bool) -> ElementState {
        let mut element = ElementState {
            tag: "a".to_string(),
            text: text.to_string(),
            visible,
            ..ElementState::default()
        };
        if let Some(href) = href {
            element.attributes.insert("href".to_string(), href.to_string());
        }
        element
    }

    #[test]
    fn test_url_and_title_patterns() {
        let url = Condition::UrlMatches {
            pattern: "/abtest".to_string(),
        };
        assert!(check_page(&url, "https://the-internet.herokuapp.com/abtest", "").holds);
        assert!(!check_page(&url, "https://the-internet.herokuapp.com/", "").holds);

        let title = Condition::TitleMatches {
            pattern: "The Internet".to_string(),
        };
        let eval = check_page(&title, "about:blank", "Untitled");
        assert!(!eval.holds);
        assert_eq!(eval.actual, "title \"Untitled\"");
    }

    #[test]
    fn test_text_conditions_normalise_whitespace() {
        let heading = ElementState {
            tag: "h1".to_string(),
            text: "Welcome to the-internet".to_string(),
            visible: true,
            ..ElementState::default()
        };

        let equals = Condition::TextEquals {
            value: " Welcome  to the-internet ".to_string(),
        };
        assert!(check_elements(&equals, &[heading.clone()], None).holds);

        let contains = Condition::TextContains {
            value: "the-internet".to_string(),
        };
        assert!(check_elements(&contains, &[heading.clone()], None).holds);

        let wrong = Condition::TextEquals {
            value: "Welcome".to_string(),
        };
        let eval = check_elements(&wrong, &[heading], None);
        assert!(!eval.holds);
        assert_eq!(eval.actual, "text \"Welcome to the-internet\"");
    }

    #[test]
    fn test_counts() {
        let links = vec![link("A", Some("/a"), true), link("B", Some("/b"), true)];

        assert!(check_elements(&Condition::CountGreaterThan { count: 0 }, &links, None).holds);
        assert!(!check_elements(&Condition::CountGreaterThan { count: 2 }, &links, None).holds);
        assert!(check_elements(&Condition::CountEquals { count: 2 }, &links, None).holds);
        assert!(!check_elements(&Condition::CountEquals { count: 1 }, &[], None).holds);
    }

    #[test]
    fn test_nth_selects_element() {
        let links = vec![link("A", Some("/a"), true), link("B", None, false)];

        assert!(check_elements(&Condition::Visible, &links, Some(0)).holds);
        assert!(!check_elements(&Condition::Visible, &links, Some(1)).holds);

        let eval = check_elements(&Condition::Visible, &links, Some(5));
        assert!(!eval.holds);
        assert_eq!(eval.actual, "no element at index 5 (2 matched)");
    }

    #[test]
    fn test_attributes() {
        let footer = vec![link(
            "Elemental Selenium",
            Some("http://elementalselenium.com/"),
            true,
        )];

        let equals = Condition::AttributeEquals {
            name: "href".to_string(),
            value: "http://elementalselenium.com/".to_string(),
        };
        assert!(check_elements(&equals, &footer, None).holds);

        let present = Condition::AttributePresent {
            name: "href".to_string(),
        };
        assert!(check_elements(&present, &footer, None).holds);
        assert!(!check_elements(&present, &[link("x", Some(""), true)], None).holds);

        let eval = check_elements(&present, &[link("x", None, true)], None);
        assert_eq!(eval.actual, "no href attribute");
    }

    #[test]
    fn test_mismatched_condition_level_never_holds() {
        let url = Condition::UrlMatches {
            pattern: ".*".to_string(),
        };
        assert!(!check_elements(&url, &[link("A", None, true)], None).holds);
        assert!(!check_page(&Condition::Visible, "https://x.test/", "x").holds);
    }

    #[test]
    fn test_invalid_pattern_fails_to_compile() {
        let bad = Condition::UrlMatches {
            pattern: "(unclosed".to_string(),
        };
        assert!(Expectation::compile(&bad).is_err());
        assert!(Expectation::compile(&Condition::Visible).is_ok());
    }

    #[test]
    fn test_compiled_expectation_is_reusable() {
        let title = Condition::TitleMatches {
            pattern: "^The Internet$".to_string(),
        };
        let expectation = Expectation::compile(&title).expect("pattern compiles");

        assert!(!expectation.check_page("", "Loading").holds);
        assert!(expectation.check_page("", "The Internet").holds);
    }
}
