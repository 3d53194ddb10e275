use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::metadata::PageMetadata;
use crate::slots::fill_slots;

pub const BANNER_START: &str = "<!-- PAGE BANNER START -->";
pub const BANNER_END: &str = "<!-- PAGE BANNER END -->";

// Each START pairs with the nearest END after it.
static BANNER_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?s){}.*?{}",
        regex::escape(BANNER_START),
        regex::escape(BANNER_END)
    ))
    .expect("banner pattern is valid")
});

/// Resolve the page banner region(s) of a document.
///
/// The home page loses its banner entirely. Every other page gets the banner
/// fragment with `{{page_title}}` and `{{breadcrumb}}` filled from `metadata`,
/// or keeps the region untouched when there is no banner fragment.
pub fn resolve_banner(
    document: &str,
    page: &str,
    is_home: bool,
    banner: Option<&str>,
    metadata: &PageMetadata,
) -> String {
    if is_home {
        return BANNER_REGION.replace_all(document, "").into_owned();
    }

    let Some(banner) = banner else {
        return document.to_string();
    };

    let filled = fill_slots(
        banner,
        &[
            ("page_title", metadata.title(page)),
            ("breadcrumb", metadata.breadcrumb(page)),
        ],
    );

    BANNER_REGION
        .replace_all(document, NoExpand(&filled))
        .into_owned()
}
