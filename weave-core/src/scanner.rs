use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SiteConfig;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

impl ScanError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A host page waiting to be composed.
#[derive(Debug, Clone)]
pub struct Document {
    /// The page identifier, i.e. the file name (`about.html`).
    pub id: String,
    /// Path relative to the source directory.
    pub path: PathBuf,
    pub text: String,
}

/// Finds components, documents and assets in a source directory.
///
/// Only the top level of the source directory holds documents and assets.
/// The components directory, the output directory, dotfiles and ignored
/// names are skipped.
pub struct SiteScanner {
    source_dir: PathBuf,
    components: String,
    output_dir: Option<PathBuf>,
    ignore: Vec<String>,
    pages: Option<Vec<String>>,
}

impl SiteScanner {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let defaults = SiteConfig::default();
        Self {
            source_dir: path.as_ref().to_path_buf(),
            components: defaults.components,
            output_dir: None,
            ignore: defaults.ignore,
            pages: None,
        }
    }

    pub fn from_config<P: AsRef<Path>>(path: P, config: &SiteConfig) -> Self {
        Self::new(path)
            .components_dir(&config.components)
            .ignore(config.ignore.clone())
            .pages(config.pages.clone())
    }

    /// Components directory name, relative to the source directory.
    pub fn components_dir<S: Into<String>>(mut self, name: S) -> Self {
        self.components = name.into();
        self
    }

    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn ignore(mut self, names: Vec<String>) -> Self {
        self.ignore = names;
        self
    }

    pub fn pages(mut self, pages: Option<Vec<String>>) -> Self {
        self.pages = pages;
        self
    }

    pub fn components_path(&self) -> PathBuf {
        self.source_dir.join(&self.components)
    }

    /// `(name, fragment)` for every `*.html` file in the components directory,
    /// ordered by file name.
    pub fn scan_components(&self) -> Result<Vec<(String, String)>, ScanError> {
        let dir = self.components_path();
        let mut paths = Vec::new();

        for entry in std::fs::read_dir(&dir).map_err(ScanError::io(&dir))? {
            let path = entry.map_err(ScanError::io(&dir))?.path();
            if path.is_file() && is_html(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut components = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_stem()
                .ok_or_else(|| ScanError::InvalidPath(path.clone()))?
                .to_string_lossy()
                .to_string();
            let fragment = std::fs::read_to_string(&path).map_err(ScanError::io(&path))?;
            debug!(component = %name, path = %path.display(), "found component");
            components.push((name, fragment));
        }

        Ok(components)
    }

    /// Every top-level `*.html` page, restricted to the configured page list
    /// when there is one.
    pub fn scan_documents(&self) -> Result<Vec<Document>, ScanError> {
        let mut documents = Vec::new();

        for path in self.top_level_entries()? {
            if !(path.is_file() && is_html(&path)) {
                continue;
            }

            let id = file_name(&path)?;
            if let Some(pages) = &self.pages {
                if !pages.contains(&id) {
                    continue;
                }
            }

            let text = std::fs::read_to_string(&path).map_err(ScanError::io(&path))?;
            let relative_path = path
                .strip_prefix(&self.source_dir)
                .map_err(|_| ScanError::InvalidPath(path.clone()))?
                .to_path_buf();

            documents.push(Document {
                id,
                path: relative_path,
                text,
            });
        }

        if let Some(pages) = &self.pages {
            for page in pages {
                if !documents.iter().any(|d| &d.id == page) {
                    warn!(page = %page, "listed page not found in source directory");
                }
            }
        }

        Ok(documents)
    }

    /// Top-level files and directories copied verbatim, relative to the
    /// source directory.
    pub fn scan_assets(&self) -> Result<Vec<PathBuf>, ScanError> {
        let mut assets = Vec::new();

        for path in self.top_level_entries()? {
            if path.is_file() && is_html(&path) {
                continue;
            }
            let relative_path = path
                .strip_prefix(&self.source_dir)
                .map_err(|_| ScanError::InvalidPath(path.clone()))?;
            assets.push(relative_path.to_path_buf());
        }

        Ok(assets)
    }

    fn top_level_entries(&self) -> Result<Vec<PathBuf>, ScanError> {
        let output_dir = self
            .output_dir
            .as_ref()
            .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()));

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.source_dir).map_err(ScanError::io(&self.source_dir))? {
            let path = entry.map_err(ScanError::io(&self.source_dir))?.path();
            let name = file_name(&path)?;

            if name.starts_with('.') || name == self.components || self.ignore.contains(&name) {
                continue;
            }
            if let Some(output_dir) = &output_dir {
                let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
                if &canonical == output_dir {
                    continue;
                }
            }

            paths.push(path);
        }
        paths.sort();

        Ok(paths)
    }
}

fn is_html(path: &Path) -> bool {
    path.extension().map(|ext| ext == "html").unwrap_or(false)
}

fn file_name(path: &Path) -> Result<String, ScanError> {
    Ok(path
        .file_name()
        .ok_or_else(|| ScanError::InvalidPath(path.to_path_buf()))?
        .to_string_lossy()
        .to_string())
}
