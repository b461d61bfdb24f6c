//! Engine options — the already-parsed configuration an engine is built from.
//!
//! Field names also accept the camel-case spelling used by older JSON
//! configuration files (`onStartup`, `onFilechange`, …).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rule::{FileChangeTrigger, Rule, ScheduleTrigger};

/// Everything an engine needs: settings plus the rule lists of every
/// trigger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub request: RequestOptions,
    pub log: LogOptions,
    #[serde(alias = "onStartup")]
    pub on_startup: Vec<Rule>,
    #[serde(alias = "onFilechange")]
    pub on_filechange: Vec<FileChangeTrigger>,
    #[serde(alias = "onSchedule")]
    pub on_schedule: Vec<ScheduleTrigger>,
    #[serde(alias = "onInput", alias = "rules")]
    pub on_input: Vec<Rule>,
    #[serde(alias = "onShutdown")]
    pub on_shutdown: Vec<Rule>,
}

/// Settings of the `request` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Base URL that relative `route`s are joined to.
    pub url: Option<String>,
    /// Timeout applied to every HTTP call, in seconds.
    pub timeout_secs: u64,
}

impl RequestOptions {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 30,
        }
    }
}

/// Audit log settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Append-only file receiving one line per matched input.
    pub file: Option<PathBuf>,
}

impl EngineOptions {
    /// Check every rule list.
    ///
    /// Input rules need a compiling pattern and an action; every other rule
    /// needs an action. Cron expressions are checked by the scheduler that
    /// installs them.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.on_input {
            rule.validate_input_rule()?;
        }
        for rule in self.on_startup.iter().chain(&self.on_shutdown) {
            rule.root_action()?;
        }
        for trigger in &self.on_filechange {
            trigger.validate()?;
        }
        for trigger in &self.on_schedule {
            trigger.rule.root_action()?;
        }
        Ok(())
    }
}
