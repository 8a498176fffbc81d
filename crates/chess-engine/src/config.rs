//! Engine configuration loaded from TOML.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunable limits for the search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Transposition table budget in mebibytes.
    #[serde(default = "default_hash_mb")]
    pub hash_mb: usize,
    /// Deepest iteration the driver will start.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Quiescence plies below the main search.
    #[serde(default = "default_max_qdepth")]
    pub max_qdepth: u32,
    /// Nodes between checks of the stop flag and the clock.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
}

fn default_hash_mb() -> usize {
    16
}

fn default_max_depth() -> u32 {
    16
}

fn default_max_qdepth() -> u32 {
    20
}

fn default_check_interval() -> u64 {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            hash_mb: default_hash_mb(),
            max_depth: default_max_depth(),
            max_qdepth: default_max_qdepth(),
            check_interval: default_check_interval(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Raises a zero `check_interval` to one so polling never divides by zero.
    pub(crate) fn normalized(mut self) -> Self {
        self.check_interval = self.check_interval.max(1);
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = EngineConfig::from_toml_str("hash_mb = 64\nmax_depth = 8\n").unwrap();
        assert_eq!(config.hash_mb, 64);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_qdepth, 20);
        assert_eq!(config.check_interval, 1024);
    }

    #[test]
    fn zero_check_interval_is_raised() {
        let config = EngineConfig::from_toml_str("check_interval = 0").unwrap();
        assert_eq!(config.check_interval, 1);
    }

    #[test]
    fn bad_documents_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("hash_mb = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("threads = 4"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::load("/definitely/not/here/negamax.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("negamax.toml"));
    }
}
