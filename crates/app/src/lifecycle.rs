//! Lifecycle manager — owns the live trigger handles of a running engine.

use tokio::task::JoinHandle;

use crate::ports::TriggerHandle;

/// The watches and cron jobs installed by
/// [`Engine::start_triggers`](crate::engine::Engine::start_triggers), plus
/// the dispatcher tasks consuming their events.
///
/// [`shutdown`](Self::shutdown) releases every handle and waits for the
/// dispatchers to drain. Dropping a `Lifecycle` releases the handles
/// without waiting.
#[derive(Default)]
pub struct Lifecycle {
    handles: Vec<Box<dyn TriggerHandle>>,
    dispatchers: Vec<JoinHandle<()>>,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a live handle and the task dispatching its events.
    pub fn adopt(&mut self, handle: Box<dyn TriggerHandle>, dispatcher: JoinHandle<()>) {
        tracing::debug!(trigger = handle.label(), "trigger installed");
        self.handles.push(handle);
        self.dispatchers.push(dispatcher);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Labels of the live handles, in installation order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.handles.iter().map(|handle| handle.label()).collect()
    }

    /// Cancel every handle, then wait for the dispatchers to finish their
    /// in-flight chains.
    pub async fn shutdown(mut self) {
        self.release();
        for dispatcher in self.dispatchers.drain(..) {
            if let Err(err) = dispatcher.await {
                tracing::warn!(%err, "trigger dispatcher ended abnormally");
            }
        }
    }

    fn release(&mut self) {
        for handle in self.handles.drain(..) {
            tracing::info!(trigger = handle.label(), "releasing trigger");
            handle.cancel();
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("handles", &self.labels())
            .field("dispatchers", &self.dispatchers.len())
            .finish()
    }
}
