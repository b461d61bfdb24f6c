//! `store` and `clear` — write and erase variables.

use async_trait::async_trait;

use codematic_app::context::ExecutionContext;
use codematic_app::ports::ActionHandler;
use codematic_domain::error::ConfigError;
use codematic_domain::rule::{ActionNode, Outcome};

/// Sets `var` to the substituted `value`, or to the current `CODE` when
/// `value` is omitted. Values other than strings and numbers are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreAction;

#[async_trait]
impl ActionHandler for StoreAction {
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let var = node.require_str("var")?;
        let vars = ctx.variables();
        match node.get("value") {
            None => vars.set(var, vars.code()),
            Some(value) => {
                let value = vars.substitute_value(value.clone());
                if !vars.set_value(var, &value) {
                    tracing::debug!(var, "non-scalar value dropped");
                    return Ok(Outcome::Success);
                }
            }
        }
        tracing::debug!(var, "variable stored");
        Ok(Outcome::Success)
    }
}

/// Clears `var`, or every variable when `var` is omitted. Ends the chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClearAction;

#[async_trait]
impl ActionHandler for ClearAction {
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let var = node.optional_str("var")?.filter(|name| !name.is_empty());
        ctx.variables().clear(var);
        tracing::debug!(var = var.unwrap_or("*"), "variables cleared");
        Ok(Outcome::Done)
    }
}
