// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Engine configuration, loaded from TOML.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tessel_link::LinkSettings;
use thiserror::Error;

/// An error while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but cannot be read.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// The file.
        path: PathBuf,
        /// The I/O failure.
        source: io::Error,
    },
    /// The file is not valid configuration.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// `[log]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `env_logger` filter.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// `[store]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prior store states kept for inspection.
    pub history_depth: usize,
}

/// `[shader]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Build the depth-only program of every material.
    pub depth_variant: bool,
    /// Log generated sources at debug level.
    pub log_sources: bool,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            depth_variant: true,
            log_sources: false,
        }
    }
}

/// The whole configuration. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logging.
    pub log: LogConfig,
    /// Entity store.
    pub store: StoreConfig,
    /// Shader compilation.
    pub shader: ShaderConfig,
    /// Live link to the authoring tool.
    pub link: LinkSettings,
}

impl EngineConfig {
    /// Parses a configuration document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads `path`, falling back to the defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                log::info!("Loading configuration from '{}'.", path.display());
                Self::from_toml(&text)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No '{}' found. Using default configuration.", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [store]
            history_depth = 8

            [link]
            enabled = true
            reconnect_delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.store.history_depth, 8);
        assert!(config.link.enabled);
        assert_eq!(config.link.reconnect_delay_ms, 250);
        assert_eq!(config.link.ping_interval_ms, 5000);
        assert_eq!(config.link.url, "ws://localhost:9001");
        assert_eq!(config.log.filter, "info");
        assert!(config.shader.depth_variant);
    }

    #[test]
    fn test_empty_document_is_the_default() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_wrong_type_is_a_parse_error() {
        let result = EngineConfig::from_toml("[store]\nhistory_depth = \"many\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load("does/not/exist/Tessel.toml").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
