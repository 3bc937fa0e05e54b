//! Layered CLI configuration
//!
//! Configuration is loaded from, in order:
//! 1. Global defaults (`<config_dir>/extplan/config.toml`)
//! 2. The file given with `--config`
//!
//! Later layers override earlier ones field by field. A missing global file
//! is skipped; a missing explicit file is an error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// How plans are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// The effective configuration after merging all layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Extension types supported on top of the catalog's handlers.
    pub handlers: Vec<String>,
    pub output: OutputFormat,
}

/// One configuration file. Unset fields leave the previous layer alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    handlers: Option<Vec<String>>,
    output: Option<OutputFormat>,
}

impl Config {
    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(handlers) = layer.handlers {
            self.handlers = handlers;
        }
        if let Some(output) = layer.output {
            self.output = output;
        }
    }
}

/// Resolves configuration by merging the global and explicit files.
pub struct ConfigResolver {
    explicit: Option<PathBuf>,
    /// Override for the global config directory (used for testing).
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            global_config_dir_override: None,
        }
    }

    /// Create a resolver reading global defaults from `global_config_dir`.
    pub fn with_global_config_dir(explicit: Option<PathBuf>, global_config_dir: PathBuf) -> Self {
        Self {
            explicit,
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("extplan"))
    }

    pub fn resolve(&self) -> Result<Config> {
        let mut config = Config::default();

        if let Some(global_dir) = self.global_config_dir() {
            let global_config_path = global_dir.join("config.toml");
            if global_config_path.is_file() {
                tracing::debug!(?global_config_path, "Loading global config");
                config.apply(load_layer(&global_config_path)?);
            } else {
                tracing::debug!(?global_config_path, "No global config found, skipping");
            }
        }

        if let Some(path) = &self.explicit {
            if !path.is_file() {
                return Err(CliError::user(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!(?path, "Loading config");
            config.apply(load_layer(path)?);
        }

        Ok(config)
    }
}

fn load_layer(path: &Path) -> Result<ConfigLayer> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}
