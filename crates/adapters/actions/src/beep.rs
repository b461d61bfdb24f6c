//! `beep` — rings the terminal bell.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use codematic_app::context::ExecutionContext;
use codematic_app::ports::ActionHandler;
use codematic_domain::error::ConfigError;
use codematic_domain::rule::{ActionNode, Outcome};

const BELL: &[u8] = b"\x07";
const DEFAULT_DELAY_MS: u64 = 500;

/// Writes `count` bells (default 1) to standard output, `delay` ms apart
/// (default 500). Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct BeepAction;

#[async_trait]
impl ActionHandler for BeepAction {
    async fn execute(
        &self,
        node: &ActionNode,
        _ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let count = node.optional_u64("count")?.unwrap_or(1);
        let delay = Duration::from_millis(node.optional_u64("delay")?.unwrap_or(DEFAULT_DELAY_MS));

        tracing::debug!(count, "beep");
        let mut stdout = tokio::io::stdout();
        for i in 0..count {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }
            let written = async {
                stdout.write_all(BELL).await?;
                stdout.flush().await
            };
            if let Err(err) = written.await {
                tracing::warn!(%err, "failed to ring terminal bell");
                break;
            }
        }
        Ok(Outcome::Success)
    }
}
