//! Plugin configuration

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use session_manager::SessionConfig;

/// Top-level plugin configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub model: ModelConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Model artifact location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the model artifact, read once at attach
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/models/jump_height_model.onnx"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl PluginConfig {
    /// Default configuration pointing at a specific model
    pub fn for_model(path: impl Into<PathBuf>) -> Self {
        Self {
            model: ModelConfig { path: path.into() },
            ..Default::default()
        }
    }

    /// Load configuration from a file (format chosen by extension)
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_manager::FailurePolicy;

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin.toml");
        std::fs::write(
            &path,
            r#"
[model]
path = "/data/models/jump.onnx"

[session]
workers = 2
failure_policy = "skip_and_continue"

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = PluginConfig::load_from_path(&path).unwrap();
        assert_eq!(config.model.path, PathBuf::from("/data/models/jump.onnx"));
        assert_eq!(config.session.workers, 2);
        assert_eq!(config.session.failure_policy, FailurePolicy::SkipAndContinue);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin.toml");
        std::fs::write(&path, "[model]\npath = \"m.onnx\"\n").unwrap();

        let config = PluginConfig::load_from_path(&path).unwrap();
        assert_eq!(config.session.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(PluginConfig::load_from_path("/nonexistent/plugin.toml").is_err());
    }
}
