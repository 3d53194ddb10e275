use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::headline::HeadlineStyles;
use crate::metadata::PageMetadata;
use crate::placeholder::LabelTable;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
}

/// Site configuration, usually read from `weave.toml` in the source directory.
///
/// Every section is optional. A section that is present replaces the
/// corresponding default wholesale, so a `[labels]` table must list every
/// override it wants to keep.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub labels: LabelTable,
    #[serde(flatten)]
    pub metadata: PageMetadata,
    pub headline: HeadlineStyles,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    /// Like [`Config::read`], but a missing file yields the defaults.
    pub fn read_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::parse(&data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(data)?;
        Ok(config)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    /// Page identifier of the home page. Its banner region is removed.
    pub home: String,
    /// Directory (relative to the source) holding the component fragments.
    pub components: String,
    /// Component used to fill the page banner region.
    pub banner: String,
    /// When set, only these pages are composed.
    pub pages: Option<Vec<String>>,
    /// Top-level entries that are neither composed nor copied.
    pub ignore: Vec<String>,
    /// Treat duplicate component names as an error instead of a warning.
    pub strict: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            home: "index.html".into(),
            components: "components".into(),
            banner: "page-banner".into(),
            pages: None,
            ignore: vec!["node_modules".to_string(), "weave.toml".to_string()],
            strict: false,
        }
    }
}
