//! Pending-action registration
//!
//! The extension's own navigation opens documents and moves the caret, which
//! the host then reports back as user events. Entries registered here are
//! consulted by the event handlers so a programmatic open or reveal is not
//! mistaken for a user action and re-run through the selection logic.
//!
//! The same table also serializes multi-step reactions per document: hosts
//! commonly deliver near-duplicate events for one logical change (auto
//! formatters are the usual culprit), so a second trigger arriving while the
//! first is still running for that document is dropped, not queued.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

/// A reveal the extension has initiated but the host has not yet reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReveal {
    pub node_id: String,
    pub file: PathBuf,
}

#[derive(Default)]
pub struct ActionRegistration {
    pending_open: parking_lot::Mutex<Vec<PathBuf>>,
    pending_reveal: parking_lot::Mutex<Vec<PendingReveal>>,
    documents: AsyncMutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl ActionRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pending_open(&self, path: &Path) {
        self.pending_open.lock().push(path.to_path_buf());
    }

    pub fn deregister_pending_open(&self, path: &Path) {
        self.pending_open.lock().retain(|item| item != path);
    }

    pub fn pending_open_includes(&self, path: &Path) -> bool {
        self.pending_open.lock().iter().any(|item| item == path)
    }

    pub fn register_pending_reveal(&self, node_id: &str, file: &Path) {
        self.pending_reveal.lock().push(PendingReveal {
            node_id: node_id.to_string(),
            file: file.to_path_buf(),
        });
    }

    pub fn deregister_pending_reveal(&self, node_id: &str) {
        self.pending_reveal
            .lock()
            .retain(|item| item.node_id != node_id);
    }

    pub fn has_pending_reveal_for_file(&self, file: &Path) -> bool {
        self.pending_reveal.lock().iter().any(|item| item.file == file)
    }

    /// Run `action` unless another action is already in flight for `path`.
    /// Returns whether the action ran.
    pub async fn run_serialized<F, Fut>(&self, path: &Path, action: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let lock = {
            let mut documents = self.documents.lock().await;
            documents
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        match lock.try_lock_owned() {
            Ok(_guard) => {
                action().await;
                true
            }
            Err(_) => {
                debug!(path = %path.display(), "dropping duplicate document action");
                false
            }
        }
    }

    /// Forget the serialization lock for a closed document.
    pub async fn deregister_document(&self, path: &Path) {
        self.documents.lock().await.remove(path);
    }
}
