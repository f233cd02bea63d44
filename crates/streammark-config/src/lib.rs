//! Configuration for the streammark pipeline controller: loads an
//! `EngineConfig` from a TOML file, falling back to documented defaults for
//! anything the file omits (or when there is no file at all).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MdxCompileMode {
    Server,
    Worker,
}

impl Default for MdxCompileMode {
    fn default() -> Self {
        MdxCompileMode::Server
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AnticipationSettings {
    pub inline: bool,
    pub math_inline: bool,
    pub math_block: bool,
    pub html: bool,
    pub mdx: bool,
    pub regex: bool,
}

impl Default for AnticipationSettings {
    fn default() -> Self {
        Self {
            inline: true,
            math_inline: false,
            math_block: false,
            html: false,
            mdx: false,
            regex: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BackpressureSettings {
    pub target_queue_depth: usize,
    pub max_queue_depth: usize,
    pub smoothing_factor: f64,
    pub low_credit_cutoff: f64,
    pub min_heavy_patch_budget: usize,
    pub max_heavy_patch_budget: usize,
}

impl Default for BackpressureSettings {
    fn default() -> Self {
        Self {
            target_queue_depth: 10,
            max_queue_depth: 100,
            smoothing_factor: 0.3,
            low_credit_cutoff: 0.5,
            min_heavy_patch_budget: 1,
            max_heavy_patch_budget: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub inline_cache_capacity: usize,
    pub highlight_cache_capacity: usize,
    pub mdx_cache_capacity: usize,
    pub mdx_compile_mode: MdxCompileMode,
    pub max_coalesce_window: usize,
    pub anticipation: AnticipationSettings,
    pub backpressure: BackpressureSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inline_cache_capacity: 2000,
            highlight_cache_capacity: 200,
            mdx_cache_capacity: 128,
            mdx_compile_mode: MdxCompileMode::default(),
            max_coalesce_window: 50,
            anticipation: AnticipationSettings::default(),
            backpressure: BackpressureSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },
}

impl EngineConfig {
    /// Loads config from `path`, or returns the default config if `path`
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        if !path_ref.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load("/nonexistent/path/engine.toml").unwrap();
        assert_eq!(config.inline_cache_capacity, 2000);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "max_coalesce_window = 10\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.max_coalesce_window, 10);
        assert_eq!(config.highlight_cache_capacity, 200);
    }

    #[test]
    fn invalid_toml_is_reported_as_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "max_coalesce_window = [not valid").unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
