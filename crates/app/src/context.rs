//! Execution context handed to every action handler.

use std::sync::Arc;

use crate::ports::{OutputSink, TracingOutput};
use crate::variables::Variables;

/// What a handler may touch while running: the engine's variables and its
/// output sink.
#[derive(Clone)]
pub struct ExecutionContext {
    variables: Variables,
    output: Arc<dyn OutputSink>,
}

impl ExecutionContext {
    #[must_use]
    pub fn new(variables: Variables, output: Arc<dyn OutputSink>) -> Self {
        Self { variables, output }
    }

    #[must_use]
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Send a line to the output sink.
    pub fn emit(&self, line: &str) {
        self.output.emit(line);
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(Variables::new(), Arc::new(TracingOutput))
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}
