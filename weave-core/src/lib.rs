pub mod banner;
pub mod builder;
pub mod compose;
pub mod config;
pub mod headline;
pub mod metadata;
pub mod placeholder;
pub mod registry;
pub mod scanner;
pub mod slots;

use std::path::Path;

// Re-export main types
pub use banner::resolve_banner;
pub use builder::{BuildError, BuildReport, OUTPUT_MARKER, Site, SiteBuilder};
pub use compose::{ComposeError, Compositor};
pub use config::{Config, ConfigError, SiteConfig};
pub use headline::{HeadlineStyle, HeadlineStyles, HeadlineVariant, resolve_headlines};
pub use metadata::PageMetadata;
pub use placeholder::{LabelTable, PlaceholderResolver, resolve_placeholders};
pub use registry::ComponentRegistry;
pub use scanner::{Document, ScanError, SiteScanner};

/// Run one complete build of `source_dir` into `output_dir`.
pub fn build_site(
    config: &Config,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<BuildReport, BuildError> {
    SiteBuilder::new()
        .source_dir(source_dir)
        .output_dir(output_dir)
        .config(config.clone())
        .build()?
        .render_all()
}
