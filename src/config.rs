//! Configuration file support
//!
//! Settings come from a TOML file with `[layout]`, `[parser]` and `[output]`
//! tables. Every key is optional. The file is taken from `--config` when
//! given, otherwise from `<config dir>/newspaper-pdf/config.toml` when that
//! exists, otherwise built-in defaults apply.
//!
//! ```toml
//! [layout]
//! line_margin = 0.5
//! boxes_flow = 0.5
//!
//! [parser]
//! strategy = "auto"
//!
//! [output]
//! path = "newspaper_data.csv"
//! jobs = 4
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::header::ParserOptions;
use crate::layout::LayoutParams;

/// Default CSV output file
pub const DEFAULT_OUTPUT: &str = "newspaper_data.csv";

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "newspaper-pdf";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Output and run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// CSV file written after a batch
    pub path: PathBuf,
    /// Worker count (0 = one per CPU)
    pub jobs: usize,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT),
            jobs: 1,
            progress: true,
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub layout: LayoutParams,
    pub parser: ParserOptions,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse TOML text; layout values are clamped into range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(text)?;
        config.layout = config.layout.clamped();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load from an explicit path, else the default location, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::debug!("Loading config from {}", path.display());
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
