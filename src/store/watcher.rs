//! Refresh-path watcher
//!
//! The tracing agent touches a refresh path after it finishes writing a new
//! recording. Watching that path (debounced, since agents write in bursts)
//! lets the UI offer the new trace without polling. Deletions are ignored;
//! only create/change matter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};

use crate::bus::{EventBus, TraceEvent};
use crate::error::{Result, TraceScopeError};

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Watches the agent's refresh path and publishes [`TraceEvent::DbTouched`]
pub struct DbWatcher {
    path: PathBuf,
    bus: Arc<EventBus>,
    debouncer: Option<Debouncer<notify::RecommendedWatcher>>,
}

impl DbWatcher {
    pub fn new(path: PathBuf, bus: Arc<EventBus>) -> Self {
        Self {
            path,
            bus,
            debouncer: None,
        }
    }

    /// Start watching. Missing refresh paths are not an error; the agent may
    /// not have produced any trace yet.
    pub fn start(&mut self) -> Result<()> {
        if self.debouncer.is_some() {
            return Ok(());
        }
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "refresh path absent, watcher idle");
            return Ok(());
        }

        let bus = Arc::clone(&self.bus);
        let mut debouncer = new_debouncer(DEBOUNCE_WINDOW, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        if event.kind == DebouncedEventKind::Any {
                            tracing::debug!(path = %event.path.display(), "refresh path touched");
                            bus.publish(&TraceEvent::DbTouched {
                                path: event.path.clone(),
                            });
                        }
                    }
                }
                Err(err) => tracing::warn!(%err, "refresh watcher error"),
            }
        })
        .map_err(watcher_error)?;

        debouncer
            .watcher()
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(watcher_error)?;
        self.debouncer = Some(debouncer);
        tracing::info!(path = %self.path.display(), "watching refresh path");
        Ok(())
    }

    pub fn stop(&mut self) {
        self.debouncer = None;
    }

    pub fn is_watching(&self) -> bool {
        self.debouncer.is_some()
    }
}

fn watcher_error(err: notify::Error) -> TraceScopeError {
    TraceScopeError::Watcher {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_is_not_fatal() {
        let bus = Arc::new(EventBus::new());
        let mut watcher = DbWatcher::new(PathBuf::from("/nonexistent/refresh"), bus);
        watcher.start().unwrap();
        assert!(!watcher.is_watching());
    }

    #[test]
    fn test_start_stop() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Arc::new(EventBus::new());
        let mut watcher = DbWatcher::new(dir.path().to_path_buf(), bus);
        watcher.start().unwrap();
        assert!(watcher.is_watching());
        // Second start is a no-op
        watcher.start().unwrap();
        watcher.stop();
        assert!(!watcher.is_watching());
    }
}
