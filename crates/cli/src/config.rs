use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ursa_core::{EngineConfig, Section};

/// CLI configuration loaded from a TOML file.
///
/// ```toml
/// bears = ["LineCountBear", "SummaryEchoBear"]
///
/// [engine]
/// worker_threads = 4
/// unit_timeout_ms = 2000
///
/// [settings]
/// max_line_length = "100"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Bears to run when none are named on the command line
    #[serde(default)]
    pub bears: Vec<String>,

    /// Default bear settings, overridden by `--set`
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl CliConfig {
    /// Return the default config file path: ~/.config/ursa/config.toml
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("ursa");
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    ///
    /// A missing default file yields the defaults; a missing explicit path
    /// is an error. `URSA_*` environment overrides are applied to the
    /// engine section either way.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (PathBuf::from(p), true),
            None => (Self::default_config_path()?, false),
        };

        let mut config = if config_path.exists() || explicit {
            debug!(?config_path, "loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?
        } else {
            debug!(?config_path, "config file not found, using defaults");
            Self::default()
        };

        config.engine.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the bear settings section: config defaults, then `overrides`.
    pub fn section(&self, overrides: &[(String, String)]) -> Section {
        let mut section = Section::new("ursa");
        for (key, value) in self.settings.iter().chain(overrides.iter().map(|(k, v)| (k, v))) {
            section.set(key, value.as_str());
        }
        section
    }
}

#[cfg(test)]
mod tests {
    use ursa_core::ExecutorKind;

    use super::*;

    #[test]
    fn parse_full_config() {
        let config = CliConfig::parse(
            r#"
bears = ["LineCountBear"]

[engine]
worker_threads = 3
executor = "inline"

[settings]
max_line_length = "100"
"#,
        )
        .unwrap();

        assert_eq!(config.bears, vec!["LineCountBear"]);
        assert_eq!(config.engine.worker_threads, 3);
        assert_eq!(config.engine.executor, ExecutorKind::Inline);
        assert_eq!(config.settings["max_line_length"], "100");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = CliConfig::parse("").unwrap();
        assert!(config.bears.is_empty());
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn overrides_win_over_config_settings() {
        let config = CliConfig::parse("[settings]\nmax_line_length = \"100\"\nkeep = \"yes\"\n").unwrap();
        let section = config.section(&[("MAX_LINE_LENGTH".to_string(), "60".to_string())]);
        assert_eq!(section.get("max_line_length"), Some("60"));
        assert_eq!(section.get("keep"), Some("yes"));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        assert!(CliConfig::load(Some("/nonexistent/ursa/config.toml")).is_err());
    }
}
