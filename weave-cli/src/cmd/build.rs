use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::Path;
use tracing::warn;
use weave_core::{BuildReport, build_site};

use crate::config::{WeaveConfig, load_build_config};

pub fn add_build_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("DIR")
                .help("Source directory containing pages, components and assets [default: .]"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for generated site [default: ./dist]"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file [default: ./weave.toml]"),
        )
}

pub fn make_subcommand() -> Command {
    add_build_args(Command::new("build")).about("Compose pages from components into the output directory")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    // Load cascading configuration
    let weave_config = load_build_config(args)?;
    let report = run_build(&weave_config)?;

    println!(
        "Site built successfully in {} ({} pages, {} assets)",
        weave_config.build_config().output,
        report.pages,
        report.assets
    );

    Ok(())
}

/// One full build. The site config is re-read every time so edits to it are
/// picked up by watch rebuilds.
pub fn run_build(config: &WeaveConfig) -> Result<BuildReport> {
    let build_config = config.build_config();
    let site_config = config.site_config()?;

    let source_dir = Path::new(&build_config.source);
    let output_dir = Path::new(&build_config.output);

    let report = build_site(&site_config, source_dir, output_dir)
        .with_context(|| format!("failed to build {}", source_dir.display()))?;

    if !report.duplicates.is_empty() {
        warn!(
            duplicates = %report.duplicates.join(", "),
            "some components were defined more than once; set `site.strict = true` to fail instead"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;

    #[test]
    fn builds_configured_site() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("components")).unwrap();
        std::fs::write(root.join("components/footer.html"), "<footer/>").unwrap();
        std::fs::write(root.join("index.html"), "<!-- FOOTER COMPONENT -->").unwrap();

        let config = WeaveConfig {
            build: BuildConfig {
                source: root.to_string_lossy().to_string(),
                output: root.join("dist").to_string_lossy().to_string(),
                config: root.join("weave.toml").to_string_lossy().to_string(),
                ..BuildConfig::default()
            },
        };

        let report = run_build(&config).unwrap();
        assert_eq!(report.pages, 1);
        assert_eq!(
            std::fs::read_to_string(root.join("dist/index.html")).unwrap(),
            "<footer/>"
        );
    }

    #[test]
    fn malformed_site_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("weave.toml"), "[site\n").unwrap();

        let config = WeaveConfig {
            build: BuildConfig {
                source: root.to_string_lossy().to_string(),
                output: root.join("dist").to_string_lossy().to_string(),
                config: root.join("weave.toml").to_string_lossy().to_string(),
                ..BuildConfig::default()
            },
        };

        assert!(run_build(&config).is_err());
    }
}
