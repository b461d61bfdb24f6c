//! Output port — where the `output` action writes.

/// Receives text emitted by rules.
pub trait OutputSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Sink forwarding every line to `tracing` at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutput;

impl OutputSink for TracingOutput {
    fn emit(&self, line: &str) {
        tracing::info!(target: "codematic::output", "{line}");
    }
}
