//! Configuration loading, validation, and management for schemafill.
//!
//! Loads configuration from `~/.schemafill/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.schemafill/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Schema compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Defaults engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Schemas registered before every compile
    #[serde(default)]
    pub schemas: SchemasConfig,

    /// Output formatting
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Fail on keywords outside the 2020-12 vocabulary.
    #[serde(default)]
    pub strict_keywords: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Validate every filled document against its schema.
    #[serde(default)]
    pub validate_output: bool,
}

fn default_max_depth() -> usize {
    512
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            validate_output: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemasConfig {
    /// Schema files made available as `$ref` targets.
    #[serde(default)]
    pub preload: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// Load configuration from the default path (~/.schemafill/config.toml).
    ///
    /// Environment variables override the file:
    /// - `SCHEMAFILL_STRICT_KEYWORDS`
    /// - `SCHEMAFILL_MAX_DEPTH`
    /// - `SCHEMAFILL_LOG_LEVEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Relative preload paths are relative to the config file.
        if let Some(dir) = path.parent() {
            for schema in &mut config.schemas.preload {
                if schema.is_relative() {
                    *schema = dir.join(&*schema);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides read through `lookup` (normally the process
    /// environment).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(strict) = lookup("SCHEMAFILL_STRICT_KEYWORDS") {
            self.compiler.strict_keywords = parse_bool(&strict).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "SCHEMAFILL_STRICT_KEYWORDS must be true or false, got '{strict}'"
                ))
            })?;
        }
        if let Some(depth) = lookup("SCHEMAFILL_MAX_DEPTH") {
            self.engine.max_depth = depth.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "SCHEMAFILL_MAX_DEPTH must be a positive integer, got '{depth}'"
                ))
            })?;
        }
        if let Some(level) = lookup("SCHEMAFILL_LOG_LEVEL") {
            self.log.level = level;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".schemafill")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "engine.max_depth must be at least 1".into(),
            ));
        }

        if !LOG_LEVELS.contains(&self.log.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log.level
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config default`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(!config.compiler.strict_keywords);
        assert_eq!(config.engine.max_depth, 512);
        assert!(config.output.pretty);
        assert_eq!(config.log.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.engine.max_depth, config.engine.max_depth);
        assert_eq!(parsed.log.level, config.log.level);
    }

    #[test]
    fn zero_depth_rejected() {
        let config = AppConfig {
            engine: EngineConfig {
                max_depth: 0,
                validate_output: false,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let mut config = AppConfig::default();
        config.log.level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.engine.max_depth, 512);
    }

    #[test]
    fn partial_file_fills_in_defaults_and_resolves_preloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[engine]\nvalidate_output = true\n\n[schemas]\npreload = [\"common.json\", \"/abs/other.json\"]\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!(config.engine.validate_output);
        assert_eq!(config.engine.max_depth, 512);
        assert_eq!(config.schemas.preload[0], dir.path().join("common.json"));
        assert_eq!(config.schemas.preload[1], PathBuf::from("/abs/other.json"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nmax_depth = \"deep\"\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SCHEMAFILL_STRICT_KEYWORDS", "true"),
            ("SCHEMAFILL_MAX_DEPTH", "64"),
            ("SCHEMAFILL_LOG_LEVEL", "debug"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert!(config.compiler.strict_keywords);
        assert_eq!(config.engine.max_depth, 64);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn malformed_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|name| (name == "SCHEMAFILL_MAX_DEPTH").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("SCHEMAFILL_MAX_DEPTH"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_depth = 512"));
        assert!(toml_str.contains("[log]"));
    }
}
