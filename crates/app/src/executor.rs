//! Action chain executor — walks an action tree one node at a time.
//!
//! The executor resolves each node's handler, awaits its outcome and picks
//! the continuation for that outcome. It is a loop, so arbitrarily long
//! chains run in constant stack.

use tracing::Instrument;

use codematic_domain::error::ConfigError;
use codematic_domain::id::RunId;
use codematic_domain::rule::{ActionNode, Outcome};

use crate::context::ExecutionContext;
use crate::registry::ActionRegistry;

/// One executed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub action: String,
    pub outcome: Outcome,
}

/// What a finished chain did, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub run_id: RunId,
    pub steps: Vec<Step>,
}

impl ChainReport {
    /// Outcome of the last executed action.
    #[must_use]
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.steps.last().map(|step| step.outcome)
    }

    /// Action types in execution order.
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.action.as_str()).collect()
    }
}

/// Runs action chains against a registry and a context.
pub struct ChainExecutor<'a> {
    registry: &'a ActionRegistry,
    context: &'a ExecutionContext,
}

impl<'a> ChainExecutor<'a> {
    #[must_use]
    pub fn new(registry: &'a ActionRegistry, context: &'a ExecutionContext) -> Self {
        Self { registry, context }
    }

    /// Execute the chain rooted at `root` until no continuation applies.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`]: an unknown action type, or a
    /// handler rejecting its parameters. Steps executed before the error
    /// are not rolled back.
    pub async fn run(&self, root: &ActionNode) -> Result<ChainReport, ConfigError> {
        let run_id = RunId::new();
        let span = tracing::info_span!("chain", %run_id, root = %root.kind);
        self.walk(run_id, root).instrument(span).await
    }

    async fn walk(&self, run_id: RunId, root: &ActionNode) -> Result<ChainReport, ConfigError> {
        let mut steps = Vec::new();
        let mut current = Some(root);

        while let Some(node) = current {
            let handler = self.registry.resolve(&node.kind)?;
            let outcome = handler.execute(node, self.context).await?;
            tracing::debug!(action = %node.kind, %outcome, "action finished");
            steps.push(Step {
                action: node.kind.clone(),
                outcome,
            });
            current = node.continuation(outcome);
        }

        Ok(ChainReport { run_id, steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::ports::ActionHandler;

    // ── Recording handler ──────────────────────────────────────────

    /// Records every invocation and replays scripted outcomes.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        script: Mutex<VecDeque<Outcome>>,
    }

    impl Recorder {
        fn scripted(outcomes: &[Outcome]) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                script: Mutex::new(outcomes.iter().copied().collect()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionHandler for Recorder {
        async fn execute(
            &self,
            node: &ActionNode,
            _ctx: &ExecutionContext,
        ) -> Result<Outcome, ConfigError> {
            let label = node
                .optional_str("label")?
                .unwrap_or(node.kind.as_str())
                .to_string();
            self.calls.lock().unwrap().push(label);
            Ok(self.script.lock().unwrap().pop_front().unwrap_or(Outcome::Success))
        }
    }

    struct Rejecting;

    #[async_trait]
    impl ActionHandler for Rejecting {
        async fn execute(
            &self,
            node: &ActionNode,
            _ctx: &ExecutionContext,
        ) -> Result<Outcome, ConfigError> {
            Err(ConfigError::missing(&node.kind, "data"))
        }
    }

    fn registry_with(recorder: &Arc<Recorder>) -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry.register("step", Arc::clone(recorder) as Arc<dyn ActionHandler>);
        registry.register("reject", Arc::new(Rejecting));
        registry
    }

    fn step(label: &str) -> ActionNode {
        ActionNode::new("step").param("label", label)
    }

    #[tokio::test]
    async fn should_not_follow_then_when_handler_reports_error() {
        let recorder = Recorder::scripted(&[Outcome::Error]);
        let registry = registry_with(&recorder);
        let ctx = ExecutionContext::default();

        let root = step("root").then(step("next"));
        let report = ChainExecutor::new(&registry, &ctx).run(&root).await.unwrap();

        assert_eq!(recorder.calls(), vec!["root"]);
        assert_eq!(report.last_outcome(), Some(Outcome::Error));
    }

    #[tokio::test]
    async fn should_run_exactly_two_handlers_when_root_succeeds_with_then_leaf() {
        let recorder = Recorder::scripted(&[Outcome::Success, Outcome::Success]);
        let registry = registry_with(&recorder);
        let ctx = ExecutionContext::default();

        let root = step("root").then(step("leaf"));
        let report = ChainExecutor::new(&registry, &ctx).run(&root).await.unwrap();

        assert_eq!(recorder.calls(), vec!["root", "leaf"]);
        assert_eq!(report.steps.len(), 2);
    }

    #[tokio::test]
    async fn should_follow_error_branch_when_handler_reports_error() {
        let recorder = Recorder::scripted(&[Outcome::Error, Outcome::Success]);
        let registry = registry_with(&recorder);
        let ctx = ExecutionContext::default();

        let root = step("root")
            .then(step("ok"))
            .on_error(step("recover"));
        ChainExecutor::new(&registry, &ctx).run(&root).await.unwrap();

        assert_eq!(recorder.calls(), vec!["root", "recover"]);
    }

    #[tokio::test]
    async fn should_prefer_status_branch_when_present() {
        let recorder = Recorder::scripted(&[Outcome::Status(404), Outcome::Success]);
        let registry = registry_with(&recorder);
        let ctx = ExecutionContext::default();

        let root = step("root")
            .then(step("ok"))
            .on_status(404, step("missing"));
        let report = ChainExecutor::new(&registry, &ctx).run(&root).await.unwrap();

        assert_eq!(recorder.calls(), vec!["root", "missing"]);
        assert_eq!(report.steps[0].outcome, Outcome::Status(404));
    }

    #[tokio::test]
    async fn should_follow_then_when_status_has_no_dedicated_branch() {
        let recorder = Recorder::scripted(&[Outcome::Status(500), Outcome::Success]);
        let registry = registry_with(&recorder);
        let ctx = ExecutionContext::default();

        let root = step("root").then(step("ok")).on_error(step("recover"));
        ChainExecutor::new(&registry, &ctx).run(&root).await.unwrap();

        assert_eq!(recorder.calls(), vec!["root", "ok"]);
    }

    #[tokio::test]
    async fn should_abort_chain_when_action_is_unknown() {
        let recorder = Recorder::scripted(&[]);
        let registry = registry_with(&recorder);
        let ctx = ExecutionContext::default();

        let root = step("root").then(ActionNode::new("teleport").then(step("never")));
        let err = ChainExecutor::new(&registry, &ctx).run(&root).await.unwrap_err();

        assert!(matches!(err, ConfigError::UnknownAction { action } if action == "teleport"));
        assert_eq!(recorder.calls(), vec!["root"]);
    }

    #[tokio::test]
    async fn should_abort_chain_when_handler_rejects_parameters() {
        let recorder = Recorder::scripted(&[]);
        let registry = registry_with(&recorder);
        let ctx = ExecutionContext::default();

        let root = ActionNode::new("reject").then(step("never"));
        let err = ChainExecutor::new(&registry, &ctx).run(&root).await.unwrap_err();

        assert!(matches!(err, ConfigError::MissingParameter { param: "data", .. }));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn should_run_long_chain_without_recursion() {
        let recorder = Recorder::scripted(&[]);
        let registry = registry_with(&recorder);
        let ctx = ExecutionContext::default();

        let mut root = step("leaf");
        for _ in 0..500 {
            root = step("link").then(root);
        }
        let report = ChainExecutor::new(&registry, &ctx).run(&root).await.unwrap();

        assert_eq!(report.steps.len(), 501);
        assert_eq!(report.actions().last(), Some(&"step"));
    }
}
