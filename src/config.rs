/*!
 * Configuration types for boxpub
 */

use boxpub_core_interface::join_key;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};

/// Configuration for one publish run
///
/// The five destination options (`path`, `manifest`, `box_name`, `box_dir`,
/// `version`) are mandatory; `validate` reports every one that is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Destination root: a directory, or an object store URL such as
    /// `s3://bucket/boxes` when built with the `object-store` feature
    #[serde(default)]
    pub path: String,

    /// Manifest location, relative to the destination root
    #[serde(default)]
    pub manifest: String,

    /// Name recorded in a freshly created manifest
    #[serde(default)]
    pub box_name: String,

    /// Directory under the root that holds this box's files
    #[serde(default)]
    pub box_dir: String,

    /// Version the box is published under
    #[serde(default)]
    pub version: String,

    /// Buffer size in bytes for streaming the box
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn default_chunk_size() -> usize {
    64 * 1024 // 64 KB
}

impl PublishConfig {
    /// Create a configuration with the five mandatory options set
    pub fn new<S: Into<String>>(path: S, manifest: S, box_name: S, box_dir: S, version: S) -> Self {
        Self {
            path: path.into(),
            manifest: manifest.into(),
            box_name: box_name.into(),
            box_dir: box_dir.into(),
            version: version.into(),
            chunk_size: default_chunk_size(),
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PublishError::io(path, e))?;
        toml::from_str(&contents).map_err(|e| {
            PublishError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PublishError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents).map_err(|e| PublishError::io(path, e))
    }

    /// Check that every mandatory option is set
    ///
    /// All missing options are collected into one error, in declaration order.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("path", &self.path),
            ("manifest", &self.manifest),
            ("box_name", &self.box_name),
            ("box_dir", &self.box_dir),
            ("version", &self.version),
        ];

        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(PublishError::MissingOptions(missing));
        }

        if self.chunk_size == 0 {
            return Err(PublishError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Destination key for a box file: `<box_dir>/<version>/<file_name>`
    pub fn box_key(&self, file_name: &str) -> String {
        join_key(&[&self.box_dir, &self.version, file_name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> PublishConfig {
        PublishConfig::new("/dest", "manifest.json", "mybox", "mybox", "1.0.0")
    }

    #[test]
    fn test_full_config_validates() {
        full_config().validate().unwrap();
    }

    #[test]
    fn test_default_config_reports_all_options() {
        match PublishConfig::default().validate().unwrap_err() {
            PublishError::MissingOptions(missing) => {
                assert_eq!(
                    missing,
                    vec!["path", "manifest", "box_name", "box_dir", "version"]
                );
            }
            other => panic!("expected missing options, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_version_and_box_name() {
        let mut config = full_config();
        config.version.clear();
        config.box_name = "   ".to_string();

        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("box_name"), "{}", msg);
        assert!(msg.contains("version"), "{}", msg);
        assert!(!msg.contains("box_dir"), "{}", msg);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = full_config();
        config.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(PublishError::Config(_))
        ));
    }

    #[test]
    fn test_box_key_is_stable() {
        let config = full_config();
        assert_eq!(config.box_key("pkg.box"), "mybox/1.0.0/pkg.box");
        assert_eq!(config.box_key("pkg.box"), config.box_key("pkg.box"));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("publish.toml");

        let mut config = full_config();
        config.log_level = LogLevel::Debug;
        config.to_file(&path).unwrap();

        let loaded = PublishConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PublishConfig = toml::from_str(
            r#"
path = "/srv/boxes"
manifest = "mybox/manifest.json"
box_name = "acme/mybox"
box_dir = "mybox"
version = "2.1.0"
"#,
        )
        .unwrap();

        config.validate().unwrap();
        assert_eq!(config.chunk_size, 64 * 1024);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_unparseable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "path = [").unwrap();

        assert!(matches!(
            PublishConfig::from_file(&path),
            Err(PublishError::Config(_))
        ));
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
