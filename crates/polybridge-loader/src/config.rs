//! Loader configuration parsing.
//!
//! A [`LoaderConfig`] is the value handed to a backend factory at
//! initialization. Configurations are TOML documents by convention; JSON
//! documents are accepted as well, selected by file extension.

use crate::error::{LoadError, LoadResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration for one loader backend instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Human-readable backend name override.
    #[serde(default)]
    pub name: Option<String>,

    /// Search roots applied, in order, at initialization. More can be
    /// appended later through `execution_path`.
    #[serde(default)]
    pub execution_paths: Vec<PathBuf>,

    /// Backend-private configuration key-value pairs.
    #[serde(default)]
    pub options: HashMap<String, toml::Value>,
}

impl LoaderConfig {
    /// An empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an execution path.
    pub fn with_execution_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.execution_paths.push(path.into());
        self
    }

    /// Load a configuration from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> LoadResult<Self> {
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(LoadError::InvalidConfig(format!(
                "unsupported configuration extension: {:?}",
                other
            ))),
        }
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> LoadResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(content: &str) -> LoadResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Look up a backend-private option.
    pub fn option(&self, key: &str) -> Option<&toml::Value> {
        self.options.get(key)
    }
}
