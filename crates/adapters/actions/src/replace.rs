//! `replace` — regular-expression substitution into a variable.

use async_trait::async_trait;
use regex::RegexBuilder;

use codematic_app::context::ExecutionContext;
use codematic_app::ports::ActionHandler;
use codematic_domain::error::ConfigError;
use codematic_domain::rule::{ActionNode, Outcome};

/// Replaces `pattern` in the substituted `subject` with `replacement`
/// (default empty) and stores the result in `var`.
///
/// `flags` may contain `g` (every match instead of the first) and `i`
/// (case-insensitive). Replacement strings use `$1` / `${name}` group
/// references; a `$` coming from a substituted variable is literal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplaceAction;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Flags {
    global: bool,
    case_insensitive: bool,
}

impl Flags {
    fn parse(node: &ActionNode) -> Result<Self, ConfigError> {
        let mut flags = Self::default();
        for flag in node.optional_str("flags")?.unwrap_or_default().chars() {
            match flag {
                'g' => flags.global = true,
                'i' => flags.case_insensitive = true,
                other => {
                    return Err(ConfigError::invalid(
                        &node.kind,
                        "flags",
                        format!("unsupported flag {other:?}"),
                    ));
                }
            }
        }
        Ok(flags)
    }
}

#[async_trait]
impl ActionHandler for ReplaceAction {
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let vars = ctx.variables();
        let subject = vars.substitute(node.require_str("subject")?);
        let pattern = node.require_str("pattern")?;
        let replacement = vars.substitute_with(
            node.optional_str("replacement")?.unwrap_or_default(),
            |value| value.to_string().replace('$', "$$"),
        );
        let var = node.require_str("var")?;
        let flags = Flags::parse(node)?;

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags.case_insensitive)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        let result = if flags.global {
            regex.replace_all(&subject, replacement.as_str())
        } else {
            regex.replace(&subject, replacement.as_str())
        };
        vars.set(var, result.into_owned());
        Ok(Outcome::Success)
    }
}
