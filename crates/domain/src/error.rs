//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`CodematicError`] via `From`.

/// Top-level error returned by engine entry points.
#[derive(Debug, thiserror::Error)]
pub enum CodematicError {
    /// The rule or action configuration is unusable. Aborts the evaluation
    /// that hit it.
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// A trigger source (file watch, schedule) could not be installed.
    #[error("trigger source error")]
    Trigger(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An adapter failed to initialise (HTTP client, audit log, …).
    #[error("adapter setup error")]
    Setup(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors caused by rule or action configuration.
///
/// These are never routed through an action outcome.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No handler is registered under the action type.
    #[error("unknown action type {action:?}")]
    UnknownAction { action: String },

    /// A rule lacks a field the caller requires.
    #[error("rule {rule:?} is malformed: {reason}")]
    MalformedRule { rule: String, reason: &'static str },

    /// A required action parameter is absent.
    #[error("action {action:?} is missing parameter {param:?}")]
    MissingParameter {
        action: String,
        param: &'static str,
    },

    /// An action parameter is present but unusable.
    #[error("action {action:?} has invalid parameter {param:?}: {reason}")]
    InvalidParameter {
        action: String,
        param: &'static str,
        reason: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A cron expression failed to parse.
    #[error("invalid schedule {expression:?}: {reason}")]
    InvalidSchedule { expression: String, reason: String },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::MissingParameter`].
    #[must_use]
    pub fn missing(action: impl Into<String>, param: &'static str) -> Self {
        Self::MissingParameter {
            action: action.into(),
            param,
        }
    }

    /// Shorthand for [`ConfigError::InvalidParameter`].
    #[must_use]
    pub fn invalid(action: impl Into<String>, param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            action: action.into(),
            param,
            reason: reason.into(),
        }
    }
}
