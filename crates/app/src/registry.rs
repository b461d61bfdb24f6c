//! Action registry — maps action type names to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use codematic_domain::error::ConfigError;

use crate::ports::ActionHandler;

/// Mapping from action type name to its handler.
///
/// Starts empty; the actions adapter installs the built-ins and hosts may
/// add or override entries afterwards.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` under `kind`, returning the handler it replaced.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) -> Option<Arc<dyn ActionHandler>> {
        let kind = kind.into();
        let previous = self.handlers.insert(kind.clone(), handler);
        if previous.is_some() {
            tracing::debug!(action = %kind, "action handler overridden");
        }
        previous
    }

    #[must_use]
    pub fn has(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Look up the handler for `kind`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownAction`] when nothing is registered under
    /// `kind`.
    pub fn resolve(&self, kind: &str) -> Result<&dyn ActionHandler, ConfigError> {
        self.handlers
            .get(kind)
            .map(AsRef::as_ref)
            .ok_or_else(|| ConfigError::UnknownAction {
                action: kind.to_string(),
            })
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codematic_domain::rule::{ActionNode, Outcome};

    use crate::context::ExecutionContext;

    struct Fixed(Outcome);

    #[async_trait]
    impl ActionHandler for Fixed {
        async fn execute(
            &self,
            _node: &ActionNode,
            _ctx: &ExecutionContext,
        ) -> Result<Outcome, ConfigError> {
            Ok(self.0)
        }
    }

    #[test]
    fn should_report_unknown_action_when_not_registered() {
        let registry = ActionRegistry::new();
        let err = registry.resolve("teleport").err().unwrap();
        assert!(matches!(err, ConfigError::UnknownAction { action } if action == "teleport"));
    }

    #[test]
    fn should_list_registered_kinds_sorted() {
        let mut registry = ActionRegistry::new();
        registry.register("store", Arc::new(Fixed(Outcome::Success)));
        registry.register("beep", Arc::new(Fixed(Outcome::Success)));
        assert!(registry.has("store"));
        assert!(!registry.has("exec"));
        assert_eq!(registry.kinds(), vec!["beep", "store"]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn should_replace_handler_when_registering_same_kind() {
        let mut registry = ActionRegistry::new();
        assert!(
            registry
                .register("store", Arc::new(Fixed(Outcome::Success)))
                .is_none()
        );
        assert!(
            registry
                .register("store", Arc::new(Fixed(Outcome::Error)))
                .is_some()
        );

        let handler = registry.resolve("store").unwrap();
        let outcome = handler
            .execute(&ActionNode::new("store"), &ExecutionContext::default())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Error);
    }
}
