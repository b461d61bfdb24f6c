//! # codematic-adapter-fs
//!
//! File-system adapters:
//!
//! - [`NotifyFileWatcher`] implements the `FileWatcher` port with the
//!   `notify` crate (inotify, `FSEvents`, `ReadDirectoryChangesW`, …).
//! - [`FileAuditLog`] implements the `AuditLog` port as an append-only text
//!   file, one line per matched input.
//!
//! ## Dependency rule
//!
//! Depends on `codematic-app` and `codematic-domain`.

mod audit;
mod error;
mod watcher;

pub use audit::FileAuditLog;
pub use error::FsError;
pub use watcher::NotifyFileWatcher;
