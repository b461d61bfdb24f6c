//! Trigger source ports — long-running watches and schedules.
//!
//! A source pushes raw events into a channel owned by the engine; the
//! engine's dispatchers turn them into action chains. Dropping the sender
//! side (by cancelling the handle) lets the dispatcher drain and exit.

use std::path::PathBuf;

use tokio::sync::mpsc;

use codematic_domain::error::CodematicError;
use codematic_domain::rule::{FileChangeTrigger, FileEventKind, ScheduleTrigger};
use codematic_domain::time::Timestamp;

/// A file-system change observed by a [`FileWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

impl FileChange {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// A live watch or scheduled job.
///
/// Cancelling releases the underlying OS resource and closes the event
/// channel.
pub trait TriggerHandle: Send {
    /// Human-readable description used in logs.
    fn label(&self) -> &str;

    fn cancel(self: Box<Self>);
}

/// Installs file-system watches.
pub trait FileWatcher: Send + Sync {
    /// Start watching `trigger.path`, sending every observed change to
    /// `events`. Filtering and debouncing are done by the engine.
    ///
    /// # Errors
    ///
    /// [`CodematicError::Trigger`] when the watch cannot be installed.
    fn watch(
        &self,
        trigger: &FileChangeTrigger,
        events: mpsc::Sender<FileChange>,
    ) -> Result<Box<dyn TriggerHandle>, CodematicError>;
}

/// Installs cron jobs.
pub trait Scheduler: Send + Sync {
    /// Start firing `trigger`, sending each firing time to `firings`.
    ///
    /// # Errors
    ///
    /// [`CodematicError::Config`] when the expression does not parse,
    /// [`CodematicError::Trigger`] when the job cannot be started.
    fn schedule(
        &self,
        trigger: &ScheduleTrigger,
        firings: mpsc::Sender<Timestamp>,
    ) -> Result<Box<dyn TriggerHandle>, CodematicError>;
}
