//! File-change dispatcher.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};

use codematic_domain::rule::{FileChangeTrigger, file_name_matches};

use crate::engine::Engine;
use crate::ports::FileChange;

/// Consume `events` until the watch is cancelled.
///
/// Events are filtered by kind and file name. With a debounce configured,
/// a burst of events on one path fires once, `debounce` after the last
/// event of the burst. Pending debounced paths are dropped when the channel
/// closes.
pub(crate) async fn dispatch(
    engine: Engine,
    trigger: Arc<FileChangeTrigger>,
    pattern: Option<Regex>,
    mut events: mpsc::Receiver<FileChange>,
) {
    let debounce = trigger.debounce();
    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();
    let mut chains = JoinSet::new();

    loop {
        let deadline = pending.values().min().copied();
        tokio::select! {
            event = events.recv() => {
                let Some(change) = event else { break };
                if !accepts(&trigger, pattern.as_ref(), &change) {
                    tracing::trace!(path = %change.path.display(), kind = ?change.kind, "file change filtered out");
                    continue;
                }
                if debounce.is_zero() {
                    spawn_chain(&mut chains, &engine, &trigger, change.path);
                } else {
                    pending.insert(change.path, Instant::now() + debounce);
                }
            }
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let now = Instant::now();
                let due: Vec<PathBuf> = pending
                    .iter()
                    .filter(|(_, at)| **at <= now)
                    .map(|(path, _)| path.clone())
                    .collect();
                for path in due {
                    pending.remove(&path);
                    spawn_chain(&mut chains, &engine, &trigger, path);
                }
            }
            Some(result) = chains.join_next(), if !chains.is_empty() => super::log_join(result),
        }
    }

    if !pending.is_empty() {
        tracing::debug!(count = pending.len(), "dropping debounced file changes");
    }
    super::drain(&mut chains).await;
    tracing::debug!(path = %trigger.path.display(), "file-change dispatcher stopped");
}

fn accepts(trigger: &FileChangeTrigger, pattern: Option<&Regex>, change: &FileChange) -> bool {
    trigger.accepts(change.kind) && pattern.is_none_or(|pattern| file_name_matches(pattern, &change.path))
}

fn spawn_chain(
    chains: &mut JoinSet<()>,
    engine: &Engine,
    trigger: &Arc<FileChangeTrigger>,
    path: PathBuf,
) {
    let engine = engine.clone();
    let trigger = Arc::clone(trigger);
    tracing::info!(path = %path.display(), rule = trigger.rule.label(), "file change");
    chains.spawn(async move {
        let value = path.to_string_lossy().into_owned();
        engine.fire(&trigger.rule, trigger.variable(), value).await;
    });
}
