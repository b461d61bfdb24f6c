//! Rule — an input pattern paired with the action chain it launches.
//!
//! Rules are loaded once from configuration and never change afterwards.
//! A rule selected by the input trigger needs an [`input`](Rule::input)
//! pattern; rules attached to startup, shutdown, file-change or schedule
//! registrations fire unconditionally and only need an action.

mod action;
mod matcher;
mod outcome;
mod trigger;

pub use action::{ActionNode, BuiltinAction};
pub use matcher::InputRules;
pub use outcome::Outcome;
pub use trigger::{FileChangeTrigger, FileEventKind, ScheduleTrigger, file_name_matches};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A named pattern and the root of its action tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub name: String,
    /// Regular expression matched against the trigger input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionNode>,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// The rule name, or a placeholder for anonymous rules.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        }
    }

    /// The root of the action tree.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedRule`] when the rule has no action.
    pub fn root_action(&self) -> Result<&ActionNode, ConfigError> {
        self.action.as_ref().ok_or_else(|| ConfigError::MalformedRule {
            rule: self.label().to_string(),
            reason: "missing action",
        })
    }

    /// Compile the input pattern.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedRule`] when the rule has no input pattern,
    /// [`ConfigError::InvalidPattern`] when it does not compile.
    pub fn pattern(&self) -> Result<Regex, ConfigError> {
        let pattern = self
            .input
            .as_deref()
            .ok_or_else(|| ConfigError::MalformedRule {
                rule: self.label().to_string(),
                reason: "missing input",
            })?;
        Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
    }

    /// Check the invariants of a rule used by the input trigger.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MalformedRule`] when the rule lacks an input pattern
    /// or an action, [`ConfigError::InvalidPattern`] when the pattern does
    /// not compile.
    pub fn validate_input_rule(&self) -> Result<(), ConfigError> {
        self.pattern()?;
        self.root_action()?;
        Ok(())
    }
}

/// Step-by-step builder for [`Rule`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    name: Option<String>,
    input: Option<String>,
    action: Option<ActionNode>,
}

impl RuleBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn input(mut self, pattern: impl Into<String>) -> Self {
        self.input = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn action(mut self, action: ActionNode) -> Self {
        self.action = Some(action);
        self
    }

    /// Consume the builder and return a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedRule`] if no action was given.
    pub fn build(self) -> Result<Rule, ConfigError> {
        let rule = Rule {
            name: self.name.unwrap_or_default(),
            input: self.input,
            action: self.action,
        };
        rule.root_action()?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_hit() -> ActionNode {
        ActionNode::new("store").param("var", "X").param("value", "hit")
    }

    #[test]
    fn should_build_rule_when_action_provided() {
        let rule = Rule::builder()
            .name("scan")
            .input("^A\\d+$")
            .action(store_hit())
            .build()
            .unwrap();
        assert_eq!(rule.label(), "scan");
        assert_eq!(rule.root_action().unwrap().kind, "store");
    }

    #[test]
    fn should_return_malformed_rule_when_action_missing() {
        let result = Rule::builder().name("empty").input(".*").build();
        assert!(matches!(
            result,
            Err(ConfigError::MalformedRule {
                reason: "missing action",
                ..
            })
        ));
    }

    #[test]
    fn should_label_anonymous_rules() {
        let rule = Rule::builder().action(store_hit()).build().unwrap();
        assert_eq!(rule.label(), "<unnamed>");
    }

    #[test]
    fn should_match_input_against_pattern() {
        let rule = Rule::builder()
            .input("^A\\d+$")
            .action(store_hit())
            .build()
            .unwrap();
        let pattern = rule.pattern().unwrap();
        assert!(pattern.is_match("A123"));
        assert!(!pattern.is_match("B123"));
        assert!(!pattern.is_match("A12x"));
    }

    #[test]
    fn should_reject_input_rule_without_pattern() {
        let rule = Rule::builder().action(store_hit()).build().unwrap();
        assert!(matches!(
            rule.validate_input_rule(),
            Err(ConfigError::MalformedRule {
                reason: "missing input",
                ..
            })
        ));
    }

    #[test]
    fn should_reject_input_rule_with_invalid_pattern() {
        let rule = Rule::builder()
            .input("(")
            .action(store_hit())
            .build()
            .unwrap();
        assert!(matches!(
            rule.validate_input_rule(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn should_deserialize_rule_from_json() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "name": "scan",
            "input": "^A\\d+$",
            "action": {"type": "store", "var": "X", "value": "hit"}
        }))
        .unwrap();
        assert_eq!(rule.input.as_deref(), Some("^A\\d+$"));
        assert!(rule.validate_input_rule().is_ok());
    }

    #[test]
    fn should_deserialize_rule_without_action_and_reject_it_later() {
        let rule: Rule = serde_json::from_value(serde_json::json!({"input": "x"})).unwrap();
        assert!(rule.validate_input_rule().is_err());
    }
}
