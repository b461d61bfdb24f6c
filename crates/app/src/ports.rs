//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the engine and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod action_handler;
pub mod audit_log;
pub mod output;
pub mod trigger_source;

pub use action_handler::ActionHandler;
pub use audit_log::{AuditLog, AuditRecord};
pub use output::{OutputSink, TracingOutput};
pub use trigger_source::{FileChange, FileWatcher, Scheduler, TriggerHandle};
