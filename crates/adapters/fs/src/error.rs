//! File-system adapter error types.

use std::path::PathBuf;

use codematic_domain::error::CodematicError;

/// Errors specific to the file-system adapters.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// The OS watcher could not be created.
    #[error("failed to create file watcher")]
    Watcher(#[source] notify::Error),

    /// The path could not be watched (missing, permissions, too many
    /// watches).
    #[error("failed to watch {}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl From<FsError> for CodematicError {
    fn from(err: FsError) -> Self {
        Self::Trigger(Box::new(err))
    }
}
