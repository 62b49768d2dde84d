//! Configuration types for the batch organizer

use crate::imaging::{OutputFormat, TranscodeOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default settings for the transcode command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeDefaults {
    /// Output size as a percentage of the input (100 = unchanged)
    pub scale_percent: f64,

    /// Output format
    pub format: OutputFormat,

    /// JPEG quality (1-100); other formats ignore it
    pub quality: u8,
}

impl Default for TranscodeDefaults {
    fn default() -> Self {
        Self {
            scale_percent: 100.0,
            format: OutputFormat::Jpeg,
            quality: 85,
        }
    }
}

impl TranscodeDefaults {
    /// Library options (percentage becomes a fraction)
    pub fn to_options(&self) -> TranscodeOptions {
        TranscodeOptions::new(self.scale_percent / 100.0, self.format, self.quality)
    }
}

/// Configuration for the batch organizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dry run mode - report duplicates/empty folders without deleting
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,

    /// Directory for log files (defaults to `Log/` next to the executable)
    pub log_dir: Option<PathBuf>,

    /// Transcode defaults
    pub transcode: TranscodeDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            log_dir: None,
            transcode: TranscodeDefaults::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            source: e,
        })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Write the commented sample configuration to `path`
    pub fn write_sample<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(path, Self::sample_config()).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Batch Organizer Configuration File
# This file uses TOML format (https://toml.io)

# Dry run mode - report duplicates and empty folders without deleting them
dry_run = false

# Verbose output - show every log line of an operation
verbose = false

# Directory for log files (defaults to Log/ next to the executable)
# log_dir = "D:/Logs/batch-organizer"

[transcode]
# Output size as a percentage of the input (100 = unchanged)
scale_percent = 100.0

# Output format: "jpeg", "png", "webp", "bmp", "gif" or "tiff"
# JPEG output drops transparency
format = "jpeg"

# Quality for JPEG output (1-100); other formats ignore it
quality = 85
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError {
        source: toml::ser::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert!(!config.dry_run);
        assert_eq!(config.transcode.format, OutputFormat::Jpeg);
        assert_eq!(config.transcode, TranscodeDefaults::default());
        assert_eq!(config.transcode.to_options().scale, 1.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str("dry_run = true\n[transcode]\nformat = \"png\"").unwrap();
        assert!(config.dry_run);
        assert_eq!(config.transcode.format, OutputFormat::Png);
        assert_eq!(config.transcode.quality, 85);
        assert_eq!(config.transcode.scale_percent, 100.0);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.verbose = true;
        config.transcode.quality = 70;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert!(loaded.verbose);
        assert_eq!(loaded.transcode.quality, 70);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "dry_run = \"maybe\"").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
