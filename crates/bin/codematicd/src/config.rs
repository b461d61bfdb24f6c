//! Configuration loading — TOML or JSON file with environment variable
//! overrides.
//!
//! Looks for `codematic.toml` in the working directory unless a path is
//! given. Every field has a default so the file is optional. Environment
//! variables take precedence over file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use codematic_adapter_schedule::CronScheduler;
use codematic_domain::options::EngineOptions;

const DEFAULT_PATH: &str = "codematic.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Request settings, audit log and rule lists, at the top level of the
    /// file.
    #[serde(flatten)]
    pub engine: EngineOptions,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "codematicd=info,codematic_app=info,codematic_adapter_actions=info,codematic_adapter_fs=info,codematic_adapter_schedule=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path` (or `codematic.toml` if present),
    /// apply environment-variable overrides and validate the rules.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, if the file is
    /// malformed, or if a rule or schedule is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_optional_file(Path::new(DEFAULT_PATH))?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_optional_file(path: &Path) -> Result<Self, ConfigError> {
        match Self::from_file(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parse `content` as JSON when `path` ends in `.json`, as TOML
    /// otherwise.
    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(content).map_err(ConfigError::Json)
        } else {
            toml::from_str(content).map_err(ConfigError::Toml)
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("CODEMATIC_REQUEST_URL") {
            self.engine.request.url = Some(val);
        }
        if let Some(val) = lookup("CODEMATIC_AUDIT_LOG") {
            self.engine.log.file = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("CODEMATIC_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        CronScheduler::validate(&self.engine.on_schedule)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse TOML config file")]
    Toml(#[source] toml::de::Error),
    /// JSON parse failure.
    #[error("failed to parse JSON config file")]
    Json(#[source] serde_json::Error),
    /// File I/O failure.
    #[error("failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A rule, pattern or schedule is invalid.
    #[error("invalid configuration")]
    Rules(#[from] codematic_domain::error::ConfigError),
}
