//! Trigger registrations — rules bound to a file watch or a schedule.

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::variables;

use super::Rule;

/// Kind of file-system change reported by a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEventKind {
    Create,
    Modify,
    Remove,
    /// Matches every kind when used as a filter.
    Any,
}

impl FileEventKind {
    /// Whether a filter entry of this kind accepts an observed event.
    #[must_use]
    pub fn accepts(self, observed: FileEventKind) -> bool {
        self == Self::Any || self == observed
    }
}

/// A rule fired whenever a watched path changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChangeTrigger {
    #[serde(flatten)]
    pub rule: Rule,
    /// File or directory to watch.
    pub path: PathBuf,
    /// Optional regular expression over the changed file's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Event kinds to react to. Empty means every kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<FileEventKind>,
    /// Quiet period per path before firing, in milliseconds. `0` fires on
    /// every event.
    #[serde(default)]
    pub debounce_ms: u64,
    /// Watch sub-directories too.
    #[serde(default)]
    pub recursive: bool,
    /// Variable receiving the changed path. Defaults to `FILENAME`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var: Option<String>,
}

impl FileChangeTrigger {
    /// Create a registration firing `rule` for any change under `path`.
    #[must_use]
    pub fn new(rule: Rule, path: impl Into<PathBuf>) -> Self {
        Self {
            rule,
            path: path.into(),
            pattern: None,
            events: Vec::new(),
            debounce_ms: 0,
            recursive: false,
            var: None,
        }
    }

    /// Name of the variable receiving the changed path.
    #[must_use]
    pub fn variable(&self) -> &str {
        self.var
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(variables::FILENAME)
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Whether the event kind passes the `events` filter.
    #[must_use]
    pub fn accepts(&self, kind: FileEventKind) -> bool {
        self.events.is_empty() || self.events.iter().any(|filter| filter.accepts(kind))
    }

    /// Compile the file-name pattern, if one is configured.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPattern`] when the pattern does not compile.
    pub fn name_pattern(&self) -> Result<Option<Regex>, ConfigError> {
        self.pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Check the registration's invariants.
    ///
    /// # Errors
    ///
    /// Fails when the rule has no action or the name pattern is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rule.root_action()?;
        self.name_pattern()?;
        Ok(())
    }
}

/// Whether the file name of `path` matches `pattern`.
///
/// Paths without a file name (e.g. `/`) are matched against the whole path.
#[must_use]
pub fn file_name_matches(pattern: &Regex, path: &Path) -> bool {
    let name = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy());
    pattern.is_match(&name)
}

/// A rule fired on a cron schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTrigger {
    #[serde(flatten)]
    pub rule: Rule,
    /// Cron expression, five fields (minute precision) or six/seven fields
    /// (with seconds, optional year).
    pub cron: String,
}

impl ScheduleTrigger {
    #[must_use]
    pub fn new(rule: Rule, cron: impl Into<String>) -> Self {
        Self {
            rule,
            cron: cron.into(),
        }
    }

    /// The expression in the six-or-more field form, with a zero seconds
    /// column prepended to classic five-field expressions.
    #[must_use]
    pub fn normalized_cron(&self) -> String {
        let expression = self.cron.trim();
        if expression.split_whitespace().count() == 5 {
            format!("0 {expression}")
        } else {
            expression.to_string()
        }
    }
}
