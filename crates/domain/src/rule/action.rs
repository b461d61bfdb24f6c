//! Action node — one step of an action chain.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

use super::Outcome;

/// One node of an action tree.
///
/// Parameters are written inline next to `type`:
///
/// ```json
/// { "type": "store", "var": "X", "value": "hit", "then": { "type": "beep" } }
/// ```
///
/// Children are owned, so a chain can never loop back on itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    /// Action type name, resolved through the action registry.
    #[serde(rename = "type")]
    pub kind: String,
    /// Continuation taken on a success-like outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Box<ActionNode>>,
    /// Continuation taken on an error outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Box<ActionNode>>,
    /// Continuations keyed by status code, checked before `then` for
    /// [`Outcome::Status`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on_status: BTreeMap<String, ActionNode>,
    /// Action-specific parameters.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ActionNode {
    /// Create a node of the given type with no parameters or continuations.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            then: None,
            error: None,
            on_status: BTreeMap::new(),
            params: Map::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn then(mut self, next: ActionNode) -> Self {
        self.then = Some(Box::new(next));
        self
    }

    #[must_use]
    pub fn on_error(mut self, next: ActionNode) -> Self {
        self.error = Some(Box::new(next));
        self
    }

    #[must_use]
    pub fn on_status(mut self, code: u16, next: ActionNode) -> Self {
        self.on_status.insert(code.to_string(), next);
        self
    }

    /// The continuation to follow after `outcome`, if any.
    #[must_use]
    pub fn continuation(&self, outcome: Outcome) -> Option<&ActionNode> {
        match outcome {
            Outcome::Success => self.then.as_deref(),
            Outcome::Error => self.error.as_deref(),
            Outcome::Status(code) => self
                .on_status
                .get(&code.to_string())
                .or(self.then.as_deref()),
            Outcome::Done => None,
        }
    }

    /// A raw parameter value, with `null` treated as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name).filter(|v| !v.is_null())
    }

    /// A required string parameter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingParameter`] when absent,
    /// [`ConfigError::InvalidParameter`] when not a string.
    pub fn require_str(&self, name: &'static str) -> Result<&str, ConfigError> {
        self.optional_str(name)?
            .ok_or_else(|| ConfigError::missing(&self.kind, name))
    }

    /// An optional string parameter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidParameter`] when present but not a string.
    pub fn optional_str(&self, name: &'static str) -> Result<Option<&str>, ConfigError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(ConfigError::invalid(
                &self.kind,
                name,
                format!("expected a string, got {other}"),
            )),
        }
    }

    /// An optional non-negative integer parameter. Numeric strings are
    /// accepted.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidParameter`] when present but not a
    /// non-negative integer.
    pub fn optional_u64(&self, name: &'static str) -> Result<Option<u64>, ConfigError> {
        let invalid = |v: &Value| {
            ConfigError::invalid(
                &self.kind,
                name,
                format!("expected a non-negative integer, got {v}"),
            )
        };
        match self.get(name) {
            None => Ok(None),
            Some(v @ Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(v)),
            Some(v @ Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid(v)),
            Some(other) => Err(invalid(other)),
        }
    }

    /// Name of the variable an action writes to: the `var` parameter, or
    /// `default` when it is omitted or empty.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidParameter`] when `var` is not a string.
    pub fn target_var<'a>(&'a self, default: &'a str) -> Result<&'a str, ConfigError> {
        Ok(self
            .optional_str("var")?
            .filter(|name| !name.is_empty())
            .unwrap_or(default))
    }
}

/// The built-in action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAction {
    Exec,
    Request,
    ReadFile,
    WriteFile,
    Store,
    Output,
    Clear,
    Replace,
    Beep,
}

impl BuiltinAction {
    pub const ALL: [Self; 9] = [
        Self::Exec,
        Self::Request,
        Self::ReadFile,
        Self::WriteFile,
        Self::Store,
        Self::Output,
        Self::Clear,
        Self::Replace,
        Self::Beep,
    ];

    /// The type name used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exec => "exec",
            Self::Request => "request",
            Self::ReadFile => "readfile",
            Self::WriteFile => "writefile",
            Self::Store => "store",
            Self::Output => "output",
            Self::Clear => "clear",
            Self::Replace => "replace",
            Self::Beep => "beep",
        }
    }
}

impl fmt::Display for BuiltinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownAction {
                action: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_deserialize_inline_params_and_continuations() {
        let json = serde_json::json!({
            "type": "store",
            "var": "X",
            "value": "hit",
            "then": {"type": "output", "data": "%X%"},
            "error": {"type": "beep", "count": 3}
        });
        let node: ActionNode = serde_json::from_value(json).unwrap();
        assert_eq!(node.kind, "store");
        assert_eq!(node.require_str("var").unwrap(), "X");
        assert_eq!(node.then.as_ref().unwrap().kind, "output");
        assert_eq!(node.error.as_ref().unwrap().optional_u64("count").unwrap(), Some(3));
        assert!(!node.params.contains_key("then"));
        assert!(!node.params.contains_key("type"));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let node: ActionNode = toml::from_str(
            r#"
            type = "request"
            route = "/status"

            [on_status.404]
            type = "output"
            data = "missing"
            "#,
        )
        .unwrap();
        assert_eq!(node.kind, "request");
        assert_eq!(node.continuation(Outcome::Status(404)).unwrap().kind, "output");
    }

    #[test]
    fn should_follow_then_on_success_and_error_on_error() {
        let node = ActionNode::new("exec")
            .then(ActionNode::new("store"))
            .on_error(ActionNode::new("output"));
        assert_eq!(node.continuation(Outcome::Success).unwrap().kind, "store");
        assert_eq!(node.continuation(Outcome::Error).unwrap().kind, "output");
    }

    #[test]
    fn should_treat_status_as_success_like_without_specific_branch() {
        let node = ActionNode::new("request").then(ActionNode::new("store"));
        assert_eq!(node.continuation(Outcome::Status(200)).unwrap().kind, "store");
        assert_eq!(node.continuation(Outcome::Status(500)).unwrap().kind, "store");
    }

    #[test]
    fn should_prefer_status_branch_over_then() {
        let node = ActionNode::new("request")
            .then(ActionNode::new("store"))
            .on_status(404, ActionNode::new("beep"));
        assert_eq!(node.continuation(Outcome::Status(404)).unwrap().kind, "beep");
        assert_eq!(node.continuation(Outcome::Status(201)).unwrap().kind, "store");
    }

    #[test]
    fn should_terminate_when_no_branch_matches_outcome() {
        let node = ActionNode::new("exec").then(ActionNode::new("store"));
        assert!(node.continuation(Outcome::Error).is_none());
    }

    #[test]
    fn should_end_chain_when_outcome_is_done() {
        let node = ActionNode::new("clear")
            .then(ActionNode::new("store"))
            .on_error(ActionNode::new("beep"));
        assert!(node.continuation(Outcome::Done).is_none());
    }

    #[test]
    fn should_report_missing_and_invalid_string_params() {
        let node = ActionNode::new("output").param("data", 5);
        assert!(matches!(
            node.require_str("missing"),
            Err(ConfigError::MissingParameter { param: "missing", .. })
        ));
        assert!(matches!(
            node.require_str("data"),
            Err(ConfigError::InvalidParameter { param: "data", .. })
        ));
    }

    #[test]
    fn should_treat_null_param_as_absent() {
        let node = ActionNode::new("clear").param("var", Value::Null);
        assert_eq!(node.optional_str("var").unwrap(), None);
    }

    #[test]
    fn should_parse_numeric_strings_as_integers() {
        let node = ActionNode::new("beep").param("count", "4");
        assert_eq!(node.optional_u64("count").unwrap(), Some(4));
        let node = ActionNode::new("beep").param("count", -1);
        assert!(node.optional_u64("count").is_err());
    }

    #[test]
    fn should_use_default_target_when_var_omitted_or_empty() {
        assert_eq!(ActionNode::new("exec").target_var("RESPONSE").unwrap(), "RESPONSE");
        let node = ActionNode::new("exec").param("var", "");
        assert_eq!(node.target_var("RESPONSE").unwrap(), "RESPONSE");
        let node = ActionNode::new("exec").param("var", "OUT");
        assert_eq!(node.target_var("RESPONSE").unwrap(), "OUT");
    }

    #[test]
    fn should_parse_builtin_names() {
        for kind in BuiltinAction::ALL {
            assert_eq!(kind.as_str().parse::<BuiltinAction>().unwrap(), kind);
        }
        assert!(matches!(
            "teleport".parse::<BuiltinAction>(),
            Err(ConfigError::UnknownAction { .. })
        ));
    }
}
