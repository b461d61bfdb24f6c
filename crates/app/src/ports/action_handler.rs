//! Action handler port — one executable action type.

use async_trait::async_trait;

use codematic_domain::error::ConfigError;
use codematic_domain::rule::{ActionNode, Outcome};

use crate::context::ExecutionContext;

/// Executes one [`ActionNode`] of a given type.
///
/// Built-in handlers live in the actions adapter; hosts can register their
/// own through the [`ActionRegistry`](crate::registry::ActionRegistry),
/// replacing a built-in of the same name if they wish.
///
/// ## Contract
///
/// - Placeholders in string parameters are resolved through
///   [`ExecutionContext::variables`] before use.
/// - Runtime failures (I/O, network, process exit) are reported as
///   [`Outcome::Error`] or a status code, after storing a description in
///   the `ERROR` variable.
/// - `Err` is reserved for configuration problems detected before any I/O
///   starts (missing or invalid parameter). It aborts the chain.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the action and report exactly one outcome.
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError>;
}
