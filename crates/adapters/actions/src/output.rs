//! `output` — emits text to the engine's output sink.

use async_trait::async_trait;

use codematic_app::context::ExecutionContext;
use codematic_app::ports::ActionHandler;
use codematic_domain::error::ConfigError;
use codematic_domain::rule::{ActionNode, Outcome};

#[derive(Debug, Default, Clone, Copy)]
pub struct OutputAction;

#[async_trait]
impl ActionHandler for OutputAction {
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let data = node.require_str("data")?;
        ctx.emit(&ctx.variables().substitute(data));
        Ok(Outcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context;

    #[tokio::test]
    async fn should_emit_substituted_data() {
        let (ctx, output) = context();
        ctx.variables().set("CODE", "A123");
        let node = ActionNode::new("output").param("data", "scanned %CODE%");

        let outcome = OutputAction.execute(&node, &ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(*output.lines.lock().unwrap(), vec!["scanned A123"]);
    }

    #[tokio::test]
    async fn should_reject_output_when_data_is_missing() {
        let (ctx, output) = context();

        let err = OutputAction
            .execute(&ActionNode::new("output"), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::MissingParameter { param: "data", .. }));
        assert!(output.lines.lock().unwrap().is_empty());
    }
}
