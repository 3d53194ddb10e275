use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Returned for any page missing from a table.
pub const FALLBACK_LABEL: &str = "Page";

/// Per-page banner text, keyed by page identifier (the page's file name).
///
/// Titles and breadcrumbs live in separate tables so a page can show one
/// label in the heading and another in the trail.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PageMetadata {
    pub titles: HashMap<String, String>,
    pub breadcrumbs: HashMap<String, String>,
}

impl PageMetadata {
    pub fn new(titles: HashMap<String, String>, breadcrumbs: HashMap<String, String>) -> Self {
        Self {
            titles,
            breadcrumbs,
        }
    }

    pub fn title(&self, page: &str) -> &str {
        self.titles.get(page).map_or(FALLBACK_LABEL, String::as_str)
    }

    pub fn breadcrumb(&self, page: &str) -> &str {
        self.breadcrumbs.get(page).map_or(FALLBACK_LABEL, String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unknown_page_falls_back() {
        let metadata = PageMetadata::default();
        assert_eq!(metadata.title("unknown.html"), "Page");
        assert_eq!(metadata.breadcrumb("unknown.html"), "Page");
    }

    #[test]
    fn tables_are_independent() {
        let metadata = PageMetadata::new(
            table(&[("about.html", "About company"), ("faq.html", "FAQ")]),
            table(&[("about.html", "About Us")]),
        );

        assert_eq!(metadata.title("about.html"), "About company");
        assert_eq!(metadata.breadcrumb("about.html"), "About Us");
        assert_eq!(metadata.title("faq.html"), "FAQ");
        assert_eq!(metadata.breadcrumb("faq.html"), "Page");
    }
}
