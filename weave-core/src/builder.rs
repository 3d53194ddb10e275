use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::compose::{ComposeError, Compositor};
use crate::config::{Config, SiteConfig};
use crate::registry::ComponentRegistry;
use crate::scanner::{ScanError, SiteScanner};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Source directory not specified")]
    MissingSourceDir,
    #[error("Output directory {} would overwrite source files", .0.display())]
    OutputOverlapsSource(PathBuf),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),
    #[error("IO error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Written into every output directory; an existing directory inside the
/// source tree is only cleaned when it carries this file or is empty.
pub const OUTPUT_MARKER: &str = ".weave-output";

/// What a build produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub assets: usize,
    pub components: usize,
    /// Component names that were defined more than once.
    pub duplicates: Vec<String>,
}

pub struct SiteBuilder {
    source_dir: Option<PathBuf>,
    output_dir: PathBuf,
    config: Config,
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            source_dir: None,
            output_dir: PathBuf::from("./dist"),
            config: Config::default(),
        }
    }

    // Required configuration
    pub fn source_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Site, BuildError> {
        let source_dir = self.source_dir.ok_or(BuildError::MissingSourceDir)?;

        // Cleaning the output must never reach the sources.
        let source = source_dir.canonicalize().map_err(BuildError::io(&source_dir))?;
        let output = resolve(&self.output_dir)?;
        if overlaps_sources(&source, &output, &self.config.site) {
            return Err(BuildError::OutputOverlapsSource(self.output_dir));
        }

        Ok(Site {
            source_dir,
            output_dir: self.output_dir,
            config: self.config,
        })
    }
}

/// Absolute, with `.`/`..` folded and the deepest existing ancestor
/// canonicalized, so an output directory that does not exist yet still
/// compares against the canonical source.
fn resolve(path: &Path) -> Result<PathBuf, BuildError> {
    let absolute = std::path::absolute(path).map_err(BuildError::io(path))?;

    let mut normal = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other),
        }
    }

    for ancestor in normal.ancestors() {
        let Ok(real) = ancestor.canonicalize() else {
            continue;
        };
        return Ok(match normal.strip_prefix(ancestor) {
            Ok(rest) if !rest.as_os_str().is_empty() => real.join(rest),
            _ => real,
        });
    }
    Ok(normal)
}

/// Whether wiping `output` could delete something the build reads.
///
/// Outside the source tree only the source itself (or an ancestor) is off
/// limits. Inside it, the output may not live in the components directory or
/// in any top-level entry that is copied as an asset, and an existing
/// directory must be empty or a previous output.
fn overlaps_sources(source: &Path, output: &Path, site: &SiteConfig) -> bool {
    if source.starts_with(output) {
        return true;
    }
    let Ok(inside) = output.strip_prefix(source) else {
        return false;
    };
    let Some(Component::Normal(top)) = inside.components().next() else {
        return true;
    };
    let top = top.to_string_lossy();

    if top == site.components.as_str() {
        return true;
    }
    let copied = !top.starts_with('.') && !site.ignore.iter().any(|name| name.as_str() == top);
    if copied && source.join(&*top) != output {
        return true;
    }

    output.exists() && !is_previous_output(output)
}

fn is_previous_output(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    if dir.join(OUTPUT_MARKER).is_file() {
        return true;
    }
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// A configured build. Every call to [`Site::render_all`] is a complete,
/// independent build: nothing is carried over from a previous run.
pub struct Site {
    source_dir: PathBuf,
    output_dir: PathBuf,
    config: Config,
}

impl Site {
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn render_all(&self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        info!(
            source = %self.source_dir.display(),
            output = %self.output_dir.display(),
            "building site"
        );

        self.clean_output()?;

        let scanner = SiteScanner::from_config(&self.source_dir, &self.config.site)
            .output_dir(&self.output_dir);

        let assets = scanner.scan_assets()?;
        for asset in &assets {
            self.copy_asset(asset)?;
        }

        // The registry is complete before any page is composed.
        let sources = scanner.scan_components()?;
        let registry = if self.config.site.strict {
            ComponentRegistry::load_strict(sources)?
        } else {
            ComponentRegistry::load(sources)
        };
        let compositor = Compositor::new(&registry, &self.config)?;

        let documents = scanner.scan_documents()?;
        documents.par_iter().try_for_each(|document| {
            let html = compositor.compose(&document.id, &document.text);
            self.write_page(&document.path, &html)
        })?;

        let report = BuildReport {
            pages: documents.len(),
            assets: assets.len(),
            components: registry.len(),
            duplicates: registry.duplicates().to_vec(),
        };

        info!(
            pages = report.pages,
            assets = report.assets,
            components = report.components,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "build finished"
        );

        Ok(report)
    }

    fn clean_output(&self) -> Result<(), BuildError> {
        if self.output_dir.exists() {
            std::fs::remove_dir_all(&self.output_dir).map_err(BuildError::io(&self.output_dir))?;
        }
        std::fs::create_dir_all(&self.output_dir).map_err(BuildError::io(&self.output_dir))?;

        let marker = self.output_dir.join(OUTPUT_MARKER);
        std::fs::write(&marker, "").map_err(BuildError::io(&marker))?;
        Ok(())
    }

    fn copy_asset(&self, relative_path: &Path) -> Result<(), BuildError> {
        let from = self.source_dir.join(relative_path);
        let to = self.output_dir.join(relative_path);

        if from.is_file() {
            debug!(asset = %relative_path.display(), "copying file");
            std::fs::copy(&from, &to).map_err(BuildError::io(&to))?;
            return Ok(());
        }

        debug!(asset = %relative_path.display(), "copying directory");
        let output = self
            .output_dir
            .canonicalize()
            .map_err(BuildError::io(&self.output_dir))?;

        let entries = WalkDir::new(&from)
            .into_iter()
            .filter_entry(|e| e.path().canonicalize().map(|p| p != output).unwrap_or(true));

        for entry in entries {
            let entry = entry.map_err(|e| BuildError::Io {
                path: from.clone(),
                source: e.into(),
            })?;
            let nested = entry
                .path()
                .strip_prefix(&from)
                .map_err(|_| ScanError::InvalidPath(entry.path().to_path_buf()))?;
            let target = to.join(nested);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target).map_err(BuildError::io(&target))?;
            } else {
                std::fs::copy(entry.path(), &target).map_err(BuildError::io(&target))?;
            }
        }

        Ok(())
    }

    fn write_page(&self, relative_path: &Path, html: &str) -> Result<(), BuildError> {
        let output_path = self.output_dir.join(relative_path);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
        }
        std::fs::write(&output_path, html).map_err(BuildError::io(&output_path))?;
        debug!(page = %relative_path.display(), "wrote page");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn requires_source_dir() {
        assert!(matches!(
            SiteBuilder::new().build(),
            Err(BuildError::MissingSourceDir)
        ));
    }

    #[test]
    fn refuses_to_clean_the_sources() {
        let dir = tempfile::tempdir().unwrap();

        let same = SiteBuilder::new().source_dir(dir.path()).output_dir(dir.path()).build();
        assert!(matches!(same, Err(BuildError::OutputOverlapsSource(_))));

        let parent = dir.path().parent().unwrap();
        let above = SiteBuilder::new().source_dir(dir.path()).output_dir(parent).build();
        assert!(matches!(above, Err(BuildError::OutputOverlapsSource(_))));
    }

    #[test]
    fn refuses_output_inside_source_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("components")).unwrap();
        fs::write(root.join("components/header.html"), "<header/>").unwrap();
        fs::create_dir_all(root.join("assets/css")).unwrap();
        fs::write(root.join("assets/css/style.css"), "body {}").unwrap();

        for output in ["components", "components/out", "assets", "assets/out", "./assets/../components"] {
            let result = SiteBuilder::new().source_dir(root).output_dir(root.join(output)).build();
            assert!(
                matches!(result, Err(BuildError::OutputOverlapsSource(_))),
                "{output} was accepted"
            );
        }

        assert!(root.join("components/header.html").is_file());
        assert!(root.join("assets/css/style.css").is_file());
    }

    #[test]
    fn rebuilds_into_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("components")).unwrap();
        fs::write(root.join("components/header.html"), "<header/>").unwrap();

        for _ in 0..2 {
            let site = SiteBuilder::new()
                .source_dir(root)
                .output_dir(root.join("dist"))
                .build()
                .unwrap();
            site.render_all().unwrap();
        }
        assert!(root.join("dist").join(OUTPUT_MARKER).is_file());

        // Ignored and hidden entries are not sources.
        let site = SiteBuilder::new()
            .source_dir(root)
            .output_dir(root.join("node_modules/.cache/site"))
            .build();
        assert!(site.is_ok());

        // An unrelated directory that happens to be ignored still is not ours to wipe.
        fs::create_dir_all(root.join("node_modules/left-pad")).unwrap();
        let site = SiteBuilder::new()
            .source_dir(root)
            .output_dir(root.join("node_modules"))
            .build();
        assert!(matches!(site, Err(BuildError::OutputOverlapsSource(_))));
    }

    #[test]
    fn missing_components_dir_aborts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let site = SiteBuilder::new()
            .source_dir(dir.path())
            .output_dir(dir.path().join("dist"))
            .build()
            .unwrap();
        assert!(matches!(site.render_all(), Err(BuildError::Scan(_))));
    }

    #[test]
    fn conflicting_components_abort_the_build() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("components")).unwrap();
        fs::write(dir.path().join("components/nav.html"), "a").unwrap();
        fs::write(dir.path().join("components/NAV.html"), "b").unwrap();

        let site = SiteBuilder::new()
            .source_dir(dir.path())
            .output_dir(dir.path().join("dist"))
            .build()
            .unwrap();
        assert!(matches!(
            site.render_all(),
            Err(BuildError::Compose(ComposeError::TokenConflict { .. }))
        ));
    }
}
