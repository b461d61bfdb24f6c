//! Outcome — what an action reports when it finishes.

use std::fmt;

/// Result identifier reported by an action handler.
///
/// Selects the continuation the chain follows next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Error,
    /// A handler-specific status code, e.g. an HTTP status.
    Status(u16),
    /// The action finished and the chain ends with it, whatever branches
    /// the node declares.
    Done,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
            Self::Status(code) => code.fmt(f),
            Self::Done => f.write_str("done"),
        }
    }
}
