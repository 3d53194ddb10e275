use anyhow::{Context, Result};
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Build settings merged from CLI args, env vars, the config file and defaults.
///
/// The composition settings (`[site]`, `[labels]`, `[titles]`, ...) live in
/// the same file but are read by `weave-core` on every build, see
/// [`WeaveConfig::site_config`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WeaveConfig {
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Source directory containing pages, components and assets
    pub source: String,
    /// Output directory for the generated site
    pub output: String,
    /// Configuration file path
    pub config: String,
    /// Quiet period before a watch rebuild, in milliseconds
    pub debounce_ms: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: ".".to_string(),
            output: "./dist".to_string(),
            config: "./weave.toml".to_string(),
            debounce_ms: 300,
        }
    }
}

impl WeaveConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (WEAVE_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let defaults = Self::default();
        let config_file = args
            .try_get_one::<String>("config")
            .unwrap_or(None)
            .cloned()
            .unwrap_or_else(|| defaults.build.config.clone());

        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        builder = builder.add_source(ConfigBuilder::try_from(&defaults)?);

        // 2. Add configuration file if it exists
        if Path::new(&config_file).exists() {
            builder = builder.add_source(File::from(Path::new(&config_file)));
        }

        // 3. Add environment variables with WEAVE_ prefix
        builder = builder.add_source(
            Environment::with_prefix("WEAVE")
                .prefix_separator("_")
                .separator("__") // Use double underscore for nested keys
                .try_parsing(true),
        );

        // 4. Override with CLI arguments that were actually given
        let mut cli_overrides: HashMap<String, String> = HashMap::new();
        for key in ["source", "output", "config"] {
            if let Some(value) = args.try_get_one::<String>(key).unwrap_or(None) {
                cli_overrides.insert(format!("build.{key}"), value.clone());
            }
        }
        if let Some(debounce) = args.try_get_one::<u64>("debounce").unwrap_or(None) {
            cli_overrides.insert("build.debounce_ms".to_string(), debounce.to_string());
        }
        for (key, value) in cli_overrides {
            builder = builder.set_override(key, value)?;
        }

        let config = builder.build()?;
        let weave_config: WeaveConfig = config
            .try_deserialize()
            .with_context(|| format!("invalid build configuration in {config_file}"))?;

        Ok(weave_config)
    }

    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }

    /// Read the composition settings for one build.
    ///
    /// A missing file means defaults; a malformed one is an error.
    pub fn site_config(&self) -> Result<weave_core::Config> {
        weave_core::Config::read_or_default(&self.build.config)
            .with_context(|| format!("failed to read {}", self.build.config))
    }
}

/// Load configuration specifically for build commands
pub fn load_build_config(args: &ArgMatches) -> Result<WeaveConfig> {
    WeaveConfig::load(args)
}

/// Load configuration specifically for watch commands
pub fn load_watch_config(args: &ArgMatches) -> Result<WeaveConfig> {
    WeaveConfig::load(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, Command};

    #[test]
    fn test_default_config() {
        let config = WeaveConfig::default();
        assert_eq!(config.build.source, ".");
        assert_eq!(config.build.output, "./dist");
        assert_eq!(config.build.config, "./weave.toml");
        assert_eq!(config.build.debounce_ms, 300);
    }

    #[test]
    fn test_cli_args_override() {
        let app = Command::new("test")
            .arg(Arg::new("source").long("source").value_name("DIR"))
            .arg(Arg::new("output").long("output").value_name("DIR"))
            .arg(Arg::new("config").long("config").value_name("FILE"));

        let matches = app
            .try_get_matches_from(vec![
                "test",
                "--source",
                "/custom/source",
                "--output",
                "/custom/output",
                "--config",
                "/custom/weave.toml",
            ])
            .unwrap();

        let config = WeaveConfig::load(&matches).unwrap();
        assert_eq!(config.build.source, "/custom/source");
        assert_eq!(config.build.output, "/custom/output");
        // Should still have defaults for non-overridden values
        assert_eq!(config.build.debounce_ms, 300);
    }

    #[test]
    fn test_config_file_build_section() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("weave.toml");
        std::fs::write(
            &file,
            r#"
            [build]
            output = "./public"
            debounce_ms = 1000

            [site]
            home = "home.html"

            [titles]
            "about.html" = "About company"
            "#,
        )
        .unwrap();
        let file = file.to_string_lossy().to_string();

        let app = Command::new("test")
            .arg(Arg::new("config").long("config").value_name("FILE"))
            .arg(Arg::new("source").long("source").value_name("DIR"));
        let matches = app
            .try_get_matches_from(vec!["test", "--config", file.as_str(), "--source", "site"])
            .unwrap();

        let config = WeaveConfig::load(&matches).unwrap();
        assert_eq!(config.build.source, "site");
        assert_eq!(config.build.output, "./public");
        assert_eq!(config.build.debounce_ms, 1000);

        let site = config.site_config().unwrap();
        assert_eq!(site.site.home, "home.html");
        assert_eq!(site.metadata.title("about.html"), "About company");
    }
}
