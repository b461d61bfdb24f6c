//! # codematic-adapter-actions
//!
//! Built-in action handlers.
//!
//! | Type | Module |
//! |------|--------|
//! | `store`, `clear` | [`store`] |
//! | `output` | [`output`] |
//! | `readfile`, `writefile` | [`file`] |
//! | `exec` | [`exec`] |
//! | `request` | [`request`] |
//! | `replace` | [`replace`] |
//! | `beep` | [`beep`] |
//!
//! Every handler resolves `%NAME%` placeholders in its string parameters
//! through the engine's variables. Runtime failures store a description in
//! `ERROR` and report [`Outcome::Error`] (or a status code); only parameter
//! problems are returned as errors.
//!
//! ## Dependency rule
//!
//! Depends on `codematic-app` (for the [`ActionHandler`] port) and
//! `codematic-domain`.

pub mod beep;
mod error;
pub mod exec;
pub mod file;
pub mod output;
pub mod replace;
pub mod request;
pub mod store;

pub use error::ActionsError;

use std::fmt::Display;
use std::sync::Arc;

use codematic_app::context::ExecutionContext;
use codematic_app::ports::ActionHandler;
use codematic_app::registry::ActionRegistry;
use codematic_domain::error::CodematicError;
use codematic_domain::options::RequestOptions;
use codematic_domain::rule::{BuiltinAction, Outcome};
use codematic_domain::variables::ERROR;

/// Install every built-in handler into `registry`, replacing entries of the
/// same name.
///
/// # Errors
///
/// [`CodematicError::Setup`] when the HTTP client cannot be built.
pub fn register_builtins(
    registry: &mut ActionRegistry,
    request: &RequestOptions,
) -> Result<(), CodematicError> {
    let request = Arc::new(request::RequestAction::new(request)?);
    for kind in BuiltinAction::ALL {
        registry.register(kind.as_str(), builtin(kind, &request));
    }
    tracing::debug!(count = BuiltinAction::ALL.len(), "built-in actions registered");
    Ok(())
}

fn builtin(kind: BuiltinAction, request: &Arc<request::RequestAction>) -> Arc<dyn ActionHandler> {
    match kind {
        BuiltinAction::Exec => Arc::new(exec::ExecAction),
        BuiltinAction::Request => Arc::clone(request) as Arc<dyn ActionHandler>,
        BuiltinAction::ReadFile => Arc::new(file::ReadFileAction),
        BuiltinAction::WriteFile => Arc::new(file::WriteFileAction),
        BuiltinAction::Store => Arc::new(store::StoreAction),
        BuiltinAction::Output => Arc::new(output::OutputAction),
        BuiltinAction::Clear => Arc::new(store::ClearAction),
        BuiltinAction::Replace => Arc::new(replace::ReplaceAction),
        BuiltinAction::Beep => Arc::new(beep::BeepAction),
    }
}

/// Record a runtime failure in `ERROR` and report [`Outcome::Error`].
fn failed(ctx: &ExecutionContext, action: &str, err: impl Display) -> Outcome {
    let message = err.to_string();
    tracing::warn!(action, error = %message, "action failed");
    ctx.variables().set(ERROR, message);
    Outcome::Error
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use codematic_app::context::ExecutionContext;
    use codematic_app::ports::OutputSink;
    use codematic_app::variables::Variables;

    /// Output sink keeping every emitted line.
    #[derive(Default)]
    pub struct CaptureOutput {
        pub lines: Mutex<Vec<String>>,
    }

    impl OutputSink for CaptureOutput {
        fn emit(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    pub fn context() -> (ExecutionContext, Arc<CaptureOutput>) {
        let output = Arc::new(CaptureOutput::default());
        let ctx = ExecutionContext::new(Variables::new(), Arc::clone(&output) as Arc<dyn OutputSink>);
        (ctx, output)
    }

    pub fn text(ctx: &ExecutionContext, key: &str) -> Option<String> {
        ctx.variables().get_string(key)
    }
}
