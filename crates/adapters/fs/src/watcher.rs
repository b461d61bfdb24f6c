//! `notify`-backed [`FileWatcher`].

use notify::event::EventKind;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use codematic_app::ports::{FileChange, FileWatcher, TriggerHandle};
use codematic_domain::error::CodematicError;
use codematic_domain::rule::{FileChangeTrigger, FileEventKind};

use crate::error::FsError;

/// Watches paths with the platform's recommended `notify` backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyFileWatcher;

/// Map a `notify` event kind to the kinds rules can filter on. Access
/// events and unclassified events are ignored.
fn classify(kind: &EventKind) -> Option<FileEventKind> {
    match kind {
        EventKind::Create(_) => Some(FileEventKind::Create),
        EventKind::Modify(_) | EventKind::Any => Some(FileEventKind::Modify),
        EventKind::Remove(_) => Some(FileEventKind::Remove),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

/// Forward one `notify` callback result to the engine's channel.
///
/// Runs on the watcher's own thread, so it never blocks: when the channel
/// is full the change is dropped.
fn forward(result: notify::Result<notify::Event>, events: &mpsc::Sender<FileChange>) {
    let event = match result {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(%err, "file watcher reported an error");
            return;
        }
    };
    let Some(kind) = classify(&event.kind) else {
        return;
    };
    for path in event.paths {
        match events.try_send(FileChange::new(path, kind)) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(change)) => {
                tracing::warn!(path = %change.path.display(), "file change dropped, dispatcher is busy");
            }
        }
    }
}

struct NotifyHandle {
    label: String,
    _watcher: RecommendedWatcher,
}

impl TriggerHandle for NotifyHandle {
    fn label(&self) -> &str {
        &self.label
    }

    fn cancel(self: Box<Self>) {
        // dropping the watcher stops the OS watch and its callback sender
        drop(self);
    }
}

impl FileWatcher for NotifyFileWatcher {
    fn watch(
        &self,
        trigger: &FileChangeTrigger,
        events: mpsc::Sender<FileChange>,
    ) -> Result<Box<dyn TriggerHandle>, CodematicError> {
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
                forward(result, &events);
            })
            .map_err(FsError::Watcher)?;
        let mode = if trigger.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&trigger.path, mode)
            .map_err(|source| FsError::Watch {
                path: trigger.path.clone(),
                source,
            })?;

        tracing::info!(path = %trigger.path.display(), recursive = trigger.recursive, "watching path");
        Ok(Box::new(NotifyHandle {
            label: format!("watch {}", trigger.path.display()),
            _watcher: watcher,
        }))
    }
}
