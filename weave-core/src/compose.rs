use thiserror::Error;
use tracing::debug;

use crate::banner::resolve_banner;
use crate::config::Config;
use crate::headline::{HeadlineStyles, resolve_headlines};
use crate::metadata::PageMetadata;
use crate::placeholder::PlaceholderResolver;
use crate::registry::ComponentRegistry;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("components `{first}` and `{second}` both use the placeholder {token}")]
    TokenConflict {
        token: String,
        first: String,
        second: String,
    },
    #[error("component `{name}` is defined more than once")]
    DuplicateComponent { name: String },
    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Turns host documents into final pages.
///
/// Holds only read-only state borrowed from the registry and config, so a
/// single compositor can be shared across threads for the whole build.
#[derive(Debug)]
pub struct Compositor<'a> {
    registry: &'a ComponentRegistry,
    placeholders: PlaceholderResolver<'a>,
    metadata: &'a PageMetadata,
    headline: &'a HeadlineStyles,
    home: &'a str,
    banner: &'a str,
}

impl<'a> Compositor<'a> {
    pub fn new(registry: &'a ComponentRegistry, config: &'a Config) -> Result<Self, ComposeError> {
        Ok(Self {
            registry,
            placeholders: PlaceholderResolver::new(registry, &config.labels)?,
            metadata: &config.metadata,
            headline: &config.headline,
            home: &config.site.home,
            banner: &config.site.banner,
        })
    }

    pub fn is_home(&self, page: &str) -> bool {
        page == self.home
    }

    /// Placeholders, then the page banner, then headline variants.
    pub fn compose(&self, page: &str, document: &str) -> String {
        debug!(page, "composing");

        let content = self.placeholders.resolve(document);
        let content = resolve_banner(
            &content,
            page,
            self.is_home(page),
            self.registry.get(self.banner),
            self.metadata,
        );
        resolve_headlines(&content, self.registry, self.headline)
    }
}
