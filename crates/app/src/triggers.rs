//! Trigger dispatchers — turn raw watch and schedule events into chains.
//!
//! Each live registration gets one dispatcher task. The dispatcher owns the
//! receiving end of the source's channel, spawns one chain per accepted
//! event and, once the source is cancelled and the channel closes, waits
//! for its in-flight chains before returning.

pub mod file_change;
pub mod schedule;

use tokio::task::{JoinError, JoinSet};

/// Log the end of a spawned chain task.
fn log_join(result: Result<(), JoinError>) {
    if let Err(err) = result {
        tracing::error!(%err, "chain task panicked");
    }
}

/// Wait for every remaining chain of a dispatcher.
async fn drain(chains: &mut JoinSet<()>) {
    while let Some(result) = chains.join_next().await {
        log_join(result);
    }
}
