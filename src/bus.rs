//! Typed event bus
//!
//! Cross-component notifications flow through one explicit bus handed to
//! each component, rather than module-level channels. Subscribers run
//! synchronously on the publishing thread; dispatch works on a snapshot of
//! the handler list, so handlers may publish, subscribe, or unsubscribe
//! while an event is in flight.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// Everything the components tell each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A call node became the current selection.
    NodeSelected { id: String },
    /// A file was chosen, with no specific node.
    FileSelected { path: PathBuf },
    /// The trace database file changed on disk.
    DbTouched { path: PathBuf },
    /// A recording finished loading and the trees were rebuilt.
    DbLoaded { path: PathBuf },
    /// A recording file was deleted from disk.
    RecordingDeleted { path: PathBuf },
    /// Views should re-read their backing data.
    Reload,
}

impl TraceEvent {
    fn kind(&self) -> &'static str {
        match self {
            TraceEvent::NodeSelected { .. } => "node_selected",
            TraceEvent::FileSelected { .. } => "file_selected",
            TraceEvent::DbTouched { .. } => "db_touched",
            TraceEvent::DbLoaded { .. } => "db_loaded",
            TraceEvent::RecordingDeleted { .. } => "recording_deleted",
            TraceEvent::Reload => "reload",
        }
    }
}

type Handler = Arc<dyn Fn(&TraceEvent) + Send + Sync>;

/// Token returned by `subscribe`, used to remove the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(usize);

#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<Vec<(usize, Handler)>>,
    next_id: Mutex<usize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&TraceEvent) + Send + Sync + 'static,
    {
        let mut next = self.next_id.lock();
        let id = *next;
        *next += 1;
        self.handlers.lock().push((id, Arc::new(handler)));
        Subscription(id)
    }

    pub fn unsubscribe(&self, token: Subscription) {
        self.handlers.lock().retain(|(id, _)| *id != token.0);
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Deliver `event` to every subscriber, in subscription order. Delivery
    /// runs against a snapshot of the handler list, so a handler may
    /// subscribe or unsubscribe while the event is being dispatched; the
    /// change takes effect from the next publish.
    pub fn publish(&self, event: &TraceEvent) {
        let handlers: Vec<Handler> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        debug!(kind = event.kind(), listeners = handlers.len(), "publishing event");
        for handler in &handlers {
            handler(event);
        }
    }
}
