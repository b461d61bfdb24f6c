//! # codematic-app
//!
//! Application layer — the engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `ActionHandler` — one executable action type
//!   - `OutputSink` — where the `output` action writes
//!   - `AuditLog` — append-only record of matched inputs
//!   - `FileWatcher` / `Scheduler` — long-running trigger sources
//! - Provide the **action registry** and the **chain executor**
//! - Provide the **engine**: input trigger, startup/shutdown sequencer,
//!   file-change and schedule coordinators, and the lifecycle manager that
//!   releases trigger handles
//! - Own the per-engine shared **variable store**
//!
//! ## Dependency rule
//! Depends on `codematic-domain` only (plus `tokio` for sync, time and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod context;
pub mod engine;
pub mod executor;
pub mod lifecycle;
pub mod ports;
pub mod registry;
pub mod triggers;
pub mod variables;
