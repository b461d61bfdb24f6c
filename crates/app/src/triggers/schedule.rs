//! Schedule dispatcher.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use codematic_domain::rule::ScheduleTrigger;
use codematic_domain::time::{self, Timestamp};
use codematic_domain::variables::DATE;

use crate::engine::Engine;

/// Consume cron firings until the job is cancelled, running the rule once
/// per firing with `DATE` set to the firing time.
pub(crate) async fn dispatch(
    engine: Engine,
    trigger: Arc<ScheduleTrigger>,
    mut firings: mpsc::Receiver<Timestamp>,
) {
    let mut chains = JoinSet::new();

    loop {
        tokio::select! {
            firing = firings.recv() => {
                let Some(at) = firing else { break };
                tracing::info!(%at, rule = trigger.rule.label(), "schedule fired");
                let engine = engine.clone();
                let trigger = Arc::clone(&trigger);
                chains.spawn(async move {
                    engine.fire(&trigger.rule, DATE, time::to_variable(at)).await;
                });
            }
            Some(result) = chains.join_next(), if !chains.is_empty() => super::log_join(result),
        }
    }

    super::drain(&mut chains).await;
    tracing::debug!(cron = %trigger.cron, "schedule dispatcher stopped");
}
