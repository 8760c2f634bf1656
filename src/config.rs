//! Configuration loading
//!
//! Settings are layered, later sources winning:
//! 1. Built-in defaults
//! 2. `quarry.toml` in the working directory, or the file given explicitly
//! 3. `QUARRY_*` environment variables (`.env` is loaded first), with `__`
//!    separating nested keys: `QUARRY_VM__MAX_FORKS=1000`
//! 4. Overrides set on the builder (command-line flags)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::executor::VmConfig;

const DEFAULT_CONFIG_FILE: &str = "quarry.toml";
const ENV_PREFIX: &str = "QUARRY";

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vm: VmConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print produced JSON values
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load with defaults, the default file and the environment
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    log_level: Option<String>,
    pretty: Option<bool>,
    max_forks: Option<usize>,
}

impl ConfigBuilder {
    /// Read this file instead of `quarry.toml`; it must exist
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }

    pub fn pretty(mut self, pretty: Option<bool>) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn max_forks(mut self, max_forks: Option<usize>) -> Self {
        self.max_forks = max_forks;
        self
    }

    pub fn build(self) -> Result<Config> {
        // A missing .env is fine
        let _ = dotenvy::dotenv();

        let file = match &self.config_path {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::new(DEFAULT_CONFIG_FILE, config::FileFormat::Toml)
                .required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("log.level", self.log_level)?
            .set_override_option("output.pretty", self.pretty)?
            .set_override_option("vm.max_forks", self.max_forks.map(|n| n as i64))?
            .build()
            .context("Failed to load configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
