//! Audit log port — append-only record of matched inputs.

use std::fmt;

use async_trait::async_trait;

use codematic_domain::time::Timestamp;

/// One matched input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub at: Timestamp,
    pub rule: String,
    pub input: String,
}

impl fmt::Display for AuditRecord {
    /// `<date>: <rule>: <input>`, one record per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.rule,
            self.input
        )
    }
}

/// Persists [`AuditRecord`]s.
///
/// Failures are logged by the engine and never interrupt rule execution.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> std::io::Result<()>;
}
