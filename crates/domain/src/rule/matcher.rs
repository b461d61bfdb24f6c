//! Rule matcher — first match wins.

use regex::Regex;

use crate::error::ConfigError;

use super::Rule;

/// Input rules with their patterns compiled once, in list order.
#[derive(Debug, Clone, Default)]
pub struct InputRules {
    entries: Vec<(Regex, Rule)>,
}

impl InputRules {
    /// Compile every rule's pattern.
    ///
    /// # Errors
    ///
    /// Fails on the first rule that lacks an input pattern or an action
    /// ([`ConfigError::MalformedRule`]), or whose pattern does not compile
    /// ([`ConfigError::InvalidPattern`]).
    pub fn compile(rules: &[Rule]) -> Result<Self, ConfigError> {
        let entries = rules
            .iter()
            .map(|rule| {
                let pattern = rule.pattern()?;
                rule.root_action()?;
                Ok((pattern, rule.clone()))
            })
            .collect::<Result<_, ConfigError>>()?;
        Ok(Self { entries })
    }

    /// Find the first rule, in list order, whose pattern matches `input`.
    ///
    /// A missing input matches nothing: triggers that fire without a
    /// payload (schedules, startup) never select an input rule. Rules after
    /// the first match are not inspected.
    #[must_use]
    pub fn first_match(&self, input: Option<&str>) -> Option<&Rule> {
        let input = input?;
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.is_match(input))
            .map(|(_, rule)| rule)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::ActionNode;

    fn rule(name: &str, pattern: &str) -> Rule {
        Rule::builder()
            .name(name)
            .input(pattern)
            .action(ActionNode::new("output").param("data", name))
            .build()
            .unwrap()
    }

    fn compile(rules: &[Rule]) -> InputRules {
        InputRules::compile(rules).unwrap()
    }

    #[test]
    fn should_return_first_matching_rule_in_list_order() {
        let rules = compile(&[
            rule("digits", "^\\d+$"),
            rule("a-code", "^A"),
            rule("anything", ".*"),
        ]);
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.first_match(Some("A123")).unwrap().name, "a-code");
        assert_eq!(rules.first_match(Some("42")).unwrap().name, "digits");
        assert_eq!(rules.first_match(Some("zz")).unwrap().name, "anything");
    }

    #[test]
    fn should_return_none_when_no_rule_matches() {
        let rules = compile(&[rule("digits", "^\\d+$")]);
        assert!(rules.first_match(Some("abc")).is_none());
    }

    #[test]
    fn should_return_none_when_input_missing() {
        let rules = compile(&[rule("anything", ".*")]);
        assert!(rules.first_match(None).is_none());
    }

    #[test]
    fn should_return_none_for_empty_rule_list() {
        let rules = compile(&[]);
        assert!(rules.is_empty());
        assert!(rules.first_match(Some("A1")).is_none());
    }

    #[test]
    fn should_fail_to_compile_when_rule_lacks_input() {
        let broken = Rule {
            name: "broken".to_string(),
            input: None,
            action: Some(ActionNode::new("output")),
        };
        assert!(matches!(
            InputRules::compile(&[rule("digits", "^\\d+$"), broken]),
            Err(ConfigError::MalformedRule {
                reason: "missing input",
                ..
            })
        ));
    }

    #[test]
    fn should_fail_to_compile_when_rule_lacks_action() {
        let broken = Rule {
            name: "broken".to_string(),
            input: Some("x".to_string()),
            action: None,
        };
        assert!(matches!(
            InputRules::compile(&[broken]),
            Err(ConfigError::MalformedRule {
                reason: "missing action",
                ..
            })
        ));
    }

    #[test]
    fn should_fail_to_compile_when_pattern_invalid() {
        assert!(matches!(
            InputRules::compile(&[rule("bad", "(")]),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn should_match_unanchored_patterns_anywhere_in_input() {
        let rules = compile(&[rule("contains", "BOX")]);
        assert!(rules.first_match(Some("xxBOXyy")).is_some());
    }
}
