//! Configuration for the copybook CLI.
//!
//! Settings are resolved in this order, later sources winning:
//! - built-in defaults
//! - `copybook.toml` in the current directory, or the file given with `--config`
//! - environment variables (`COPYBOOK_*`)
//! - command-line flags

use std::path::{Path, PathBuf};

use copybook_core::CompilerOptions;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Project configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "copybook.toml";

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compiler settings.
    pub compiler: CompilerOptions,
    /// Output settings.
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (text, json).
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `copybook.toml` when it
    /// exists, then apply environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from_file(default)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply `COPYBOOK_*` variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let invalid = |name: &str, value: String, message: String| ConfigError::InvalidEnv {
            name: name.to_string(),
            value,
            message,
        };

        if let Some(val) = lookup("COPYBOOK_ENCODING") {
            self.compiler.encoding = val
                .parse()
                .map_err(|e| invalid("COPYBOOK_ENCODING", val.clone(), e))?;
        }
        if let Some(val) = lookup("COPYBOOK_SOURCE_FORMAT") {
            self.compiler.source_format = val
                .parse()
                .map_err(|e| invalid("COPYBOOK_SOURCE_FORMAT", val.clone(), e))?;
        }
        if let Some(val) = lookup("COPYBOOK_MAX_FIELD_LENGTH") {
            self.compiler.max_field_length = val.parse().map_err(|e: std::num::ParseIntError| {
                invalid("COPYBOOK_MAX_FIELD_LENGTH", val.clone(), e.to_string())
            })?;
        }
        Ok(())
    }

    /// Generate a default configuration file.
    pub fn generate_default() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Write configuration to a file.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Configuration error.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// I/O error reading/writing config.
    #[error("I/O error for {}: {message}", path.display())]
    #[diagnostic(code(copybook::config::io))]
    Io { path: PathBuf, message: String },

    /// Parse error in config file.
    #[error("parse error in {}: {message}", path.display())]
    #[diagnostic(code(copybook::config::parse))]
    Parse { path: PathBuf, message: String },

    /// Environment variable with an unusable value.
    #[error("invalid value '{value}' for {name}: {message}")]
    #[diagnostic(code(copybook::config::env))]
    InvalidEnv {
        name: String,
        value: String,
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {message}")]
    #[diagnostic(code(copybook::config::serialize))]
    Serialize { message: String },
}
