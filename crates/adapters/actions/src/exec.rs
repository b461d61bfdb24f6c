//! `exec` — runs a command through the platform shell.

use async_trait::async_trait;
use tokio::process::Command;

use codematic_app::context::ExecutionContext;
use codematic_app::ports::ActionHandler;
use codematic_domain::error::ConfigError;
use codematic_domain::rule::{ActionNode, Outcome};
use codematic_domain::variables::RESPONSE;

use crate::failed;

/// Runs `command` and stores its standard output in `var` (default
/// `RESPONSE`).
///
/// A non-zero exit status, a spawn failure or anything written to standard
/// error is reported as [`Outcome::Error`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecAction;

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[async_trait]
impl ActionHandler for ExecAction {
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let command = ctx.variables().substitute(node.require_str("command")?);
        let var = node.target_var(RESPONSE)?;

        tracing::debug!(%command, "spawning command");
        let output = match shell(&command).kill_on_drop(true).output().await {
            Ok(output) => output,
            Err(err) => return Ok(failed(ctx, &node.kind, format!("{command}: {err}"))),
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let detail = stderr.trim();
            let message = if detail.is_empty() {
                format!("{command}: {}", output.status)
            } else {
                format!("{command}: {}: {detail}", output.status)
            };
            return Ok(failed(ctx, &node.kind, message));
        }
        if !stderr.is_empty() {
            return Ok(failed(ctx, &node.kind, stderr.trim_end()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        ctx.variables().set(var, stdout);
        Ok(Outcome::Success)
    }
}
