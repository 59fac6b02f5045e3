//! Configuration for marked streams
//!
//! Settings are read from YAML. Every field has a default, so an empty
//! document is a valid configuration.

use crate::error::{Error, Result};
use crate::stream::DEFAULT_BUFFER_CAPACITY;
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Stream and persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Read buffer capacity of file streams, in bytes
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Extension appended to a data file's name to derive its markers file
    #[serde(default = "default_markers_extension")]
    pub markers_extension: String,

    /// Log level for the command-line tool
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_markers_extension() -> String {
    "marks".to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            markers_extension: default_markers_extension(),
            log_level: None,
        }
    }
}

impl StreamConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(Error::config("buffer_capacity must be greater than zero"));
        }
        if self.markers_extension.is_empty() || self.markers_extension.contains(['/', '\\']) {
            return Err(Error::config(format!(
                "invalid markers_extension: {:?}",
                self.markers_extension
            )));
        }
        Ok(())
    }

    /// Default markers file for `data_path`, e.g. `log.txt` -> `log.txt.marks`
    pub fn markers_path_for(&self, data_path: impl AsRef<Path>) -> PathBuf {
        let mut name = OsString::from(data_path.as_ref().as_os_str());
        name.push(".");
        name.push(&self.markers_extension);
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.buffer_capacity, 8 * 1024);
        assert_eq!(config.markers_extension, "marks");
        assert!(config.log_level.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(StreamConfig::from_yaml_str("").unwrap(), StreamConfig::default());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r"
buffer_capacity: 16
markers_extension: bookmarks
log_level: debug
";
        let config = StreamConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.buffer_capacity, 16);
        assert_eq!(config.markers_extension, "bookmarks");
        assert_eq!(config.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = StreamConfig::from_yaml_str("buffer_capacity: 4").unwrap();
        assert_eq!(config.buffer_capacity, 4);
        assert_eq!(config.markers_extension, "marks");
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = StreamConfig::from_yaml_str("buffer_capacity: 0").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_unknown_field() {
        let err = StreamConfig::from_yaml_str("buffer_size: 4").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_rejects_bad_extension() {
        let err = StreamConfig::from_yaml_str("markers_extension: a/b").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_markers_path_for() {
        let config = StreamConfig::default();
        assert_eq!(
            config.markers_path_for("/data/log.txt"),
            PathBuf::from("/data/log.txt.marks")
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = StreamConfig::from_file("/nonexistent/seekmark.yaml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
