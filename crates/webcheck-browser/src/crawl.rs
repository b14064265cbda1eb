//! Link discovery on a loaded page.

use scraper::{Html, Selector};
use url::Url;

/// Absolute same-site links of a page, in document order without duplicates.
///
/// `#` anchors are skipped and fragments are dropped. A link is same-site
/// when host and port match `page_url`, so `mailto:` and `javascript:`
/// targets never qualify.
#[must_use]
pub fn same_site_links(page_url: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links: Vec<Url> = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        let Ok(mut link) = page_url.join(href) else {
            tracing::debug!(%href, "skipping unparseable link");
            continue;
        };
        link.set_fragment(None);

        if link.host_str() == page_url.host_str()
            && link.port_or_known_default() == page_url.port_or_known_default()
            && !links.contains(&link)
        {
            links.push(link);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_site_links() {
        let page = Url::parse("https://the-internet.herokuapp.com/").unwrap();
        let html = r##"<html><body>
            <a href="/abtest">A/B Testing</a>
            <a href="#content">Skip</a>
            <a href="add_remove_elements/">Add/Remove</a>
            <a href="/abtest#top">A/B again</a>
            <a href="http://elementalselenium.com/">Elemental Selenium</a>
            <a href="mailto:someone@example.com">Mail</a>
            <a>No href</a>
            <a href="https://the-internet.herokuapp.com/login">Login</a>
        </body></html>"##;

        let links: Vec<String> = same_site_links(&page, html)
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            links,
            vec![
                "https://the-internet.herokuapp.com/abtest",
                "https://the-internet.herokuapp.com/add_remove_elements/",
                "https://the-internet.herokuapp.com/login",
            ]
        );
    }

    #[test]
    fn test_no_links() {
        let page = Url::parse("https://demo.test/").unwrap();
        assert!(same_site_links(&page, "<p>nothing here</p>").is_empty());
    }
}
